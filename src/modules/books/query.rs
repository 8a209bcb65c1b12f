use bookshelf_db::Filter;

/// Filter for a book listing.
///
/// `genre` must match exactly. `search` matches title, author or any tag,
/// case-insensitively. Empty parameters are treated as absent.
pub fn build_filter(genre: Option<&str>, search: Option<&str>) -> Filter {
    let mut clauses = Vec::new();

    if let Some(genre) = genre.filter(|g| !g.is_empty()) {
        clauses.push(Filter::eq("genre", genre));
    }

    if let Some(search) = search.filter(|q| !q.is_empty()) {
        clauses.push(Filter::or(vec![
            Filter::contains("title", search),
            Filter::contains("author", search),
            Filter::any_contains("tags", search),
        ]));
    }

    Filter::and(clauses)
}

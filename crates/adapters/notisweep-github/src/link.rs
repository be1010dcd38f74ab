/// Whether an RFC 8288 `Link` header advertises a `rel="next"` target.
///
/// GitHub sends e.g.
/// `<https://api.github.com/notifications?page=2>; rel="next", <...>; rel="last"`.
pub fn has_next(link_header: &str) -> bool {
    link_header.split(',').any(|entry| {
        entry.split(';').skip(1).any(|param| {
            let Some((key, value)) = param.split_once('=') else {
                return false;
            };
            key.trim().eq_ignore_ascii_case("rel")
                && value
                    .trim()
                    .trim_matches('"')
                    .split_whitespace()
                    .any(|rel| rel.eq_ignore_ascii_case("next"))
        })
    })
}

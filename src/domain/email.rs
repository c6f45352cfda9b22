/// Lower-cases the domain part of an email address.
///
/// The domain is everything after the last `@`; the local part keeps its
/// case. Input without an `@` is returned unchanged.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{local}@{}", domain.to_lowercase()),
        None => email.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_domain_only() {
        let cases = [
            ("test1@EXAMPLE.com", "test1@example.com"),
            ("Test2@Example.com", "Test2@example.com"),
            ("TEST3@EXAMPLE.COM", "TEST3@example.com"),
            ("test4@example.COM", "test4@example.com"),
        ];
        for (input, expected) in cases {
            assert_eq!(normalize_email(input), expected, "input: {input}");
        }
    }

    #[test]
    fn splits_on_last_at_sign() {
        assert_eq!(normalize_email("\"a@B\"@Example.ORG"), "\"a@B\"@example.org");
    }

    #[test]
    fn leaves_strings_without_at_sign_alone() {
        assert_eq!(normalize_email("NoDomain"), "NoDomain");
        assert_eq!(normalize_email(""), "");
    }
}

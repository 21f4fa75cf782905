/// Canonicalizes a set of present brothers into a stable group identity.
/// Same set in any input order yields the same key; the key is only ever
/// compared for equality, so duplicate names sorting together is harmless.
pub fn normalize(present_brothers: &[String]) -> String {
    let mut names: Vec<&str> = present_brothers.iter().map(|s| s.as_str()).collect();
    names.sort_unstable();
    names.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn order_independent() {
        let a = normalize(&names(&["B", "A", "C"]));
        let b = normalize(&names(&["C", "A", "B"]));
        assert_eq!(a, "A,B,C");
        assert_eq!(a, b);
    }

    #[test]
    fn single_member() {
        assert_eq!(normalize(&names(&["Raz"])), "Raz");
    }

    #[test]
    fn empty_list_gives_empty_key() {
        assert_eq!(normalize(&[]), "");
    }

    #[test]
    fn duplicates_do_not_crash() {
        assert_eq!(normalize(&names(&["A", "B", "A"])), "A,A,B");
    }
}

//! Edit distance used by prompt stability probing.

/// Minimum number of single-character insertions, deletions, and
/// substitutions (cost 1 each) to transform `source` into `target`.
///
/// Adjacent transpositions are additionally covered via the extension from
/// Berghel & Roach, "An Extension of Ukkonen's Enhanced Dynamic Programming
/// ASM Algorithm", so a swapped character pair costs less than two
/// substitutions.
pub fn edit_distance(source: &str, target: &str) -> usize {
    let source = source.as_bytes();
    let target = target.as_bytes();
    let n = source.len();
    let m = target.len();
    if n == 0 {
        return m;
    }
    if m == 0 {
        return n;
    }

    let mut table = vec![vec![0usize; m + 1]; n + 1];
    for (i, row) in table.iter_mut().enumerate() {
        row[0] = i;
    }
    for j in 0..=m {
        table[0][j] = j;
    }

    for i in 1..=n {
        let s_i = source[i - 1];
        for j in 1..=m {
            let t_j = target[j - 1];
            let cost = if s_i == t_j { 0 } else { 1 };

            let above = table[i - 1][j];
            let left = table[i][j - 1];
            let diag = table[i - 1][j - 1];
            let mut cell = (above + 1).min(left + 1).min(diag + cost);

            if i > 2 && j > 2 {
                let mut trans = table[i - 2][j - 2] + 1;
                if source[i - 2] != t_j {
                    trans += 1;
                }
                if s_i != target[j - 2] {
                    trans += 1;
                }
                cell = cell.min(trans);
            }

            table[i][j] = cell;
        }
    }

    table[n][m]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_strings() {
        assert_eq!(edit_distance("", ""), 0);
        assert_eq!(edit_distance("$ ", "$ "), 0);
        assert_eq!(edit_distance("user@host:~$", "user@host:~$"), 0);
    }

    #[test]
    fn test_empty_side() {
        assert_eq!(edit_distance("", "prompt"), 6);
        assert_eq!(edit_distance("prompt", ""), 6);
    }

    #[test]
    fn test_substitution() {
        assert_eq!(edit_distance("cat", "cut"), 1);
    }

    #[test]
    fn test_insert_delete() {
        assert_eq!(edit_distance("host", "hosts"), 1);
        assert_eq!(edit_distance("hosts", "host"), 1);
    }

    #[test]
    fn test_transposition_cheaper_than_two_substitutions() {
        // Plain Levenshtein scores an adjacent swap as 2.
        assert_eq!(edit_distance("abcdef", "abdcef"), 1);
    }

    #[test]
    fn test_distinct_prompts() {
        assert_eq!(edit_distance("$ ", "# "), 1);
    }
}

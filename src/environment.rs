use std::env;
use std::str::FromStr;

/// Retrieves an environment variable and splits it into a vector of strings based on a delimiter.
///
/// Empty segments are dropped, so an unset variable yields an empty vector.
///
/// # Arguments
/// - `var`: The name of the environment variable.
/// - `delimiter`: The character to split the environment variable's value by.
///
/// # Returns
/// - `Vec<String>`
pub fn get_env_var_as_vec(var: &str, delimiter: char) -> Vec<String> {
    split_trimmed(&env::var(var).unwrap_or_default(), delimiter)
}

/// Parses an environment variable into `T`, falling back to `default` when the
/// variable is unset or does not parse.
pub fn get_env_var_or<T: FromStr>(var: &str, default: T) -> T {
    env::var(var)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

/// Reads a boolean flag; `1`, `true`, `yes` and `on` are truthy.
pub fn get_env_flag(var: &str) -> bool {
    env::var(var)
        .map(|value| {
            matches!(
                value.trim().to_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            )
        })
        .unwrap_or(false)
}

pub(crate) fn split_trimmed(value: &str, delimiter: char) -> Vec<String> {
    value
        .split(delimiter)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_trimmed_drops_empty_segments() {
        assert_eq!(
            split_trimmed(" a ; b;;c ;", ';'),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
        assert!(split_trimmed("", ';').is_empty());
    }

    #[test]
    fn test_unset_variables_use_defaults() {
        assert_eq!(get_env_var_or("ARGUS_DEFENSE_TEST_UNSET_NUMBER", 42u64), 42);
        assert!(!get_env_flag("ARGUS_DEFENSE_TEST_UNSET_FLAG"));
        assert!(get_env_var_as_vec("ARGUS_DEFENSE_TEST_UNSET_LIST", ';').is_empty());
    }
}

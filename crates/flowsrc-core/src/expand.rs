use std::collections::HashMap;

/// Expand `$VAR` / `${VAR}` placeholders against the run environment.
/// Unknown placeholders are left verbatim.
pub fn expand(raw: &str, env: &HashMap<String, String>) -> String {
    shellexpand::env_with_context_no_errors(raw, |var| env.get(var)).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn substitutes_known_placeholders() {
        let env = env(&[("BRANCH", "release"), ("DIR", "ci")]);
        assert_eq!(expand("$DIR/Jenkinsfile.$BRANCH", &env), "ci/Jenkinsfile.release");
        assert_eq!(expand("${DIR}/lib.groovy", &env), "ci/lib.groovy");
    }

    #[test]
    fn leaves_unknown_placeholders_verbatim() {
        let env = env(&[]);
        assert_eq!(expand("pipelines/${NOPE}/main", &env), "pipelines/${NOPE}/main");
        assert_eq!(expand("$MISSING", &env), "$MISSING");
    }

    #[test]
    fn plain_paths_pass_through() {
        let env = env(&[("X", "y")]);
        assert_eq!(expand("Jenkinsfile", &env), "Jenkinsfile");
        assert_eq!(expand("", &env), "");
    }
}

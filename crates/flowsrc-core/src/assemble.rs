/// Concatenate the configured import and main script bodies.
///
/// The import body, when present, is always followed by one blank line,
/// whether or not a main body follows. Both resolution paths go through
/// here, so the output cannot reveal which path produced it.
pub fn assemble(import_text: Option<&str>, main_text: Option<&str>) -> String {
    let mut script = String::new();
    if let Some(import) = import_text {
        script.push_str(import);
        script.push_str("\n\n");
    }
    if let Some(main) = main_text {
        script.push_str(main);
    }
    script
}

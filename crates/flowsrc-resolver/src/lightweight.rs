use flowsrc_core::{assemble, ResolveError};
use flowsrc_scm::{ScmProvider, ViewError};
use tracing::info;

/// Try to resolve the script through a read-only virtual view of the
/// pinned revision, without materializing a workspace.
///
/// Returns `Ok(None)` when the source cannot serve file reads directly;
/// the caller recovers with a full checkout. A missing file, by contrast,
/// is fatal: the revision is fixed, so retrying cannot change the outcome.
pub fn try_lightweight(
    scm: &dyn ScmProvider,
    import_path: &str,
    main_path: &str,
) -> Result<Option<String>, ResolveError> {
    let Some(view) = scm.open_virtual_view() else {
        info!("lightweight checkout support not available, falling back to full checkout");
        return Ok(None);
    };

    // The view only reports that a read missed; it cannot say which of
    // the two configured files was absent, so the error names both.
    let missing = || ResolveError::MissingInView {
        import: import_path.to_string(),
        main: main_path.to_string(),
        scm_key: scm.key(),
    };
    let read = |path: &str| {
        view.read_file(path).map_err(|e| match e {
            ViewError::NotFound(_) => missing(),
            ViewError::Other(e) => ResolveError::Scm(e),
        })
    };

    let mut import_text = None;
    if !import_path.is_empty() {
        import_text = Some(read(import_path)?);
        info!("obtained import file {} from {}", import_path, scm.key());
    }
    let mut main_text = None;
    if !main_path.is_empty() {
        main_text = Some(read(main_path)?);
        info!("obtained script file {} from {}", main_path, scm.key());
    }

    Ok(Some(assemble(import_text.as_deref(), main_text.as_deref())))
}

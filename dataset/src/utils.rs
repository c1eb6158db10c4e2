use crate::common::*;

/// Lists the files with the given extension directly inside `dir`, sorted by path.
///
/// Sorting makes the enumeration order identical across platforms and runs.
pub fn list_files(dir: impl AsRef<Path>, extension: &str) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let pattern = format!(
        "{}/*.{}",
        glob::Pattern::escape(&dir.display().to_string()),
        extension
    );

    let mut files: Vec<_> = glob::glob(&pattern)?
        .map(|result| result.map_err(|err| PipelineError::io(err.path().to_owned())(err.into_error())))
        .filter(|result| !matches!(result, Ok(path) if !path.is_file()))
        .try_collect()?;
    files.sort();
    Ok(files)
}

/// Fails with [PipelineError::DirectoryNotEmpty] if `dir` exists and has
/// content. Nothing is created.
pub fn check_empty_dir(dir: impl AsRef<Path>) -> Result<()> {
    let dir = dir.as_ref();
    if !dir.exists() {
        return Ok(());
    }

    let mut entries = fs::read_dir(dir).map_err(PipelineError::io(dir))?;
    if entries.next().is_some() {
        return Err(PipelineError::DirectoryNotEmpty {
            path: dir.to_owned(),
        });
    }
    Ok(())
}

/// Makes sure `dir` exists and contains nothing.
///
/// A missing directory is created. An existing non-empty one is refused
/// without touching its content.
pub fn prepare_empty_dir(dir: impl AsRef<Path>) -> Result<()> {
    let dir = dir.as_ref();
    check_empty_dir(dir)?;
    fs::create_dir_all(dir).map_err(PipelineError::io(dir))?;
    Ok(())
}

/// Returns the file name component of a path as an owned string.
pub(crate) fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

//! A module which contains some utility functions
use serde::Serialize;
use std::{
    env,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use super::NcResult;

/// Write something which can be serialized to a json file at the specified path.
/// Returns an Error if the file can't be written or the directory can't be created.
pub fn write_serializable_to_json<P: AsRef<Path>>(
    output: &impl Serialize,
    path: P,
) -> NcResult<()> {
    let json_string = serde_json::to_string(output)?;
    write_bytes(json_string.as_bytes(), path)
}

/// Write raw bytes to the specified path, replacing the file if it exists.
/// Missing parent directories are created.
pub fn write_bytes<P: AsRef<Path>>(bytes: &[u8], path: P) -> NcResult<()> {
    if let Some(parent) = path.as_ref().parent() {
        fs::create_dir_all(parent)?;
    }

    let mut file_handle = File::create(path)?;
    file_handle.write_all(bytes)?;

    Ok(())
}

/// Finds the project root, that is the root of the git repo.
/// In particular, this will return the path to the closest ancestor to the current working directory,
/// which contains a `.git` folder.
/// If no such ancestor is found, the current working directory is retuned.
pub fn find_project_root() -> NcResult<PathBuf> {
    let cwd = env::current_dir()?;

    #[allow(clippy::redundant_closure)]
    Ok(cwd
        .ancestors()
        .find(|ancestor| has_git_directory(ancestor))
        .map(PathBuf::from)
        .unwrap_or_else(|| cwd))
}

fn has_git_directory<P>(path: P) -> bool
where
    P: AsRef<Path>,
{
    let mut path_buf = path.as_ref().to_path_buf();
    path_buf.push(".git");
    // This also checks if the path exists.
    path_buf.is_dir()
}

/// Gives you either the given path or a your specified relative path on the project root
/// If `path = Some(path_buf)` returns cloned `path_buf`, else `project_root/{relative_path}`
/// If the folder does not exist yet, it will be created.
pub fn path_or_relative_to_project_root(
    path: Option<&PathBuf>,
    relative_path: &str,
) -> NcResult<PathBuf> {
    match path {
        Some(path) => Ok(path.clone()),
        None => {
            let mut result = find_project_root()?;
            result.push(relative_path);

            if let Some(parent) = result.parent() {
                fs::create_dir_all(parent)?;
            }
            Ok(result)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_bytes_creates_parent_directories() {
        let mut path = env::temp_dir();
        path.push(format!("nocarz-util-test-{}", std::process::id()));
        path.push("nested");
        path.push("file.bin");

        write_bytes(&[1, 2, 3], &path).unwrap();
        assert_eq!(fs::read(&path).unwrap(), vec![1, 2, 3]);

        fs::remove_dir_all(path.parent().unwrap().parent().unwrap()).unwrap();
    }

    #[test]
    fn given_path_is_returned_unchanged() {
        let given = PathBuf::from("/tmp/somewhere/model.msgpack");
        assert_eq!(
            path_or_relative_to_project_root(Some(&given), "models/other").unwrap(),
            given
        );
    }
}

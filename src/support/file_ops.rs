//-
// Copyright (c) 2020, Jason Lingle
//
// This file is part of Mboxmap.
//
// Mboxmap is free software: you can  redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free
// Software Foundation, either version  3 of the License, or (at  your option)
// any later version.
//
// Mboxmap is distributed  in the hope that  it will be useful,  but WITHOUT
// ANY WARRANTY; without  even the implied  warranty of MERCHANTABILITY  or
// FITNESS FOR  A PARTICULAR  PURPOSE.  See the  GNU General  Public  License
// for more details.
//
// You should have received a copy of the GNU General Public License along with
// Mboxmap. If not, see <http://www.gnu.org/licenses/>.

//! Miscellaneous functions for working with files.

use std::fs;
use std::io::{self, BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

/// Replace the file at `path` with new content, atomically.
///
/// A temporary file is created alongside `path` and handed to `write`. Once
/// `write` returns successfully, the temporary file is given the permissions
/// of the original, synced, and renamed over `path`. If anything fails, the
/// original is left untouched and the temporary file is removed.
///
/// On success, returns the new file, opened for reading and writing.
pub fn replace_atomically<E: From<io::Error>>(
    path: &Path,
    write: impl FnOnce(&mut dyn Write) -> Result<(), E>,
) -> Result<fs::File, E> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tf = tempfile::NamedTempFile::new_in(dir)?;
    {
        let mut out = BufWriter::new(tf.as_file_mut());
        write(&mut out)?;
        out.flush()?;
    }

    let perms = fs::metadata(path)?.permissions();
    fs::set_permissions(tf.path(), perms)?;
    tf.as_file_mut().sync_all()?;
    let mut file = tf.persist(path).map_err(|e| e.error)?;
    file.seek(SeekFrom::Start(0))?;
    Ok(file)
}

#[cfg(test)]
mod test {
    use std::io::Read;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn replace_atomically_swaps_content() {
        let root = TempDir::new().unwrap();
        let path = root.path().join("box");
        fs::write(&path, b"old").unwrap();

        let mut file = replace_atomically::<io::Error>(&path, |w| {
            w.write_all(b"new content")
        })
        .unwrap();

        let mut read_back = String::new();
        fs::File::open(&path)
            .unwrap()
            .read_to_string(&mut read_back)
            .unwrap();
        assert_eq!("new content", read_back);

        read_back.clear();
        file.read_to_string(&mut read_back).unwrap();
        assert_eq!("new content", read_back);
    }

    #[test]
    fn failed_replace_leaves_original() {
        let root = TempDir::new().unwrap();
        let path = root.path().join("box");
        fs::write(&path, b"old").unwrap();

        let result = replace_atomically::<io::Error>(&path, |w| {
            w.write_all(b"partial")?;
            Err(io::Error::new(io::ErrorKind::Other, "boom"))
        });
        assert!(result.is_err());

        assert_eq!(b"old".to_vec(), fs::read(&path).unwrap());
        assert_eq!(1, fs::read_dir(root.path()).unwrap().count());
    }
}

use crate::error::{FsError, Result};
use crate::layout::{InodeRef, MAX_PATH_LENGTH, ROOT_INODE};
use alloc::string::ToString;
use alloc::vec::Vec;

// 按名字在一个目录中查找，目录不存在的名字返回 Ok(None)
pub trait DirectoryReader {
    fn lookup(&self, dir: InodeRef, name: &str) -> Result<Option<InodeRef>>;
}

// 查找过程中的位置：child 是当前目录，parent 是上一级
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Cursor {
    pub parent: InodeRef,
    pub child: InodeRef,
}

impl Cursor {
    pub const ROOT: Cursor = Cursor {
        parent: ROOT_INODE,
        child: ROOT_INODE,
    };
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Lookup<'p> {
    // 找到了目标，parent 是包含它的目录
    Found { parent: InodeRef, child: InodeRef },
    // 只有最后一个名字不存在，parent 是应该包含它的目录
    NotFound { parent: InodeRef, name: &'p str },
}

impl<'p> Lookup<'p> {
    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found { .. })
    }
}

enum Walk {
    Complete(Cursor),
    // index 是第一个没有找到的名字
    Stopped { at: Cursor, index: usize },
}

// 按 / 切分路径，连续的或者首尾的 / 不产生空名字
pub fn tokenize(path: &str) -> Vec<&str> {
    path.split('/').filter(|token| !token.is_empty()).collect()
}

// 路径的最后一个名字
pub fn last_component(path: &str) -> Option<&str> {
    path.rsplit('/').find(|token| !token.is_empty())
}

fn check_length(path: &str) -> Result<()> {
    if path.len() > MAX_PATH_LENGTH {
        return Err(FsError::PathTooLong(path.to_string()));
    }
    Ok(())
}

fn walk<R: DirectoryReader>(reader: &R, start: Cursor, tokens: &[&str]) -> Result<Walk> {
    let mut cursor = start;
    for (index, token) in tokens.iter().enumerate() {
        match reader.lookup(cursor.child, token)? {
            Some(found) => {
                cursor = Cursor {
                    parent: cursor.child,
                    child: found,
                };
            }
            None => return Ok(Walk::Stopped { at: cursor, index }),
        }
    }
    Ok(Walk::Complete(cursor))
}

// 解析工作目录，任何一个名字不存在都说明工作目录已经损坏
pub fn working_directory<R: DirectoryReader>(reader: &R, cwd: &str) -> Result<Cursor> {
    check_length(cwd)?;
    let tokens = tokenize(cwd);
    let invalid = || FsError::InvalidWorkingDirectory(cwd.to_string());
    let cursor = match walk(reader, Cursor::ROOT, &tokens) {
        Ok(Walk::Complete(cursor)) => cursor,
        Ok(Walk::Stopped { .. }) | Err(FsError::NotADirectory(_)) => return Err(invalid()),
        Err(e) => return Err(e),
    };
    // 工作目录本身也必须是目录，每个目录都有 . 条目
    match reader.lookup(cursor.child, ".") {
        Ok(Some(_)) => Ok(cursor),
        Ok(None) | Err(FsError::NotADirectory(_)) => Err(invalid()),
        Err(e) => Err(e),
    }
}

// 先从根目录解析工作目录，再从根目录（绝对路径）或工作目录（相对路径）解析目标
pub fn resolve<'p, R: DirectoryReader>(reader: &R, cwd: &str, path: &'p str) -> Result<Lookup<'p>> {
    check_length(path)?;
    let tokens = tokenize(path);
    if tokens.is_empty() {
        return Err(if path.is_empty() {
            FsError::EmptyPath
        } else {
            FsError::RootNotNamed
        });
    }
    let working = working_directory(reader, cwd)?;
    let base = if path.starts_with('/') {
        Cursor::ROOT
    } else {
        working
    };
    let walked = walk(reader, base, &tokens).map_err(|e| match e {
        FsError::NotADirectory(_) => FsError::NotADirectory(path.to_string()),
        e => e,
    })?;
    match walked {
        Walk::Complete(cursor) => Ok(Lookup::Found {
            parent: cursor.parent,
            child: cursor.child,
        }),
        Walk::Stopped { at, index } if index + 1 == tokens.len() => Ok(Lookup::NotFound {
            parent: at.child,
            name: tokens[index],
        }),
        Walk::Stopped { .. } => Err(FsError::MissingComponent(path.to_string())),
    }
}

#[cfg(test)]
mod path_tests {
    use super::*;
    use alloc::collections::BTreeMap;
    use alloc::string::String;
    use crate::error::ErrorKind;

    // 内存中的目录树：(目录, 名字) -> inode，files 中的 inode 不是目录
    struct Tree {
        entries: BTreeMap<(InodeRef, String), InodeRef>,
        files: Vec<InodeRef>,
    }

    impl Tree {
        fn new() -> Self {
            let mut tree = Self {
                entries: BTreeMap::new(),
                files: Vec::new(),
            };
            tree.link(ROOT_INODE, ROOT_INODE, ".");
            tree.link(ROOT_INODE, ROOT_INODE, "..");
            tree
        }

        fn link(&mut self, dir: InodeRef, inode: InodeRef, name: &str) {
            self.entries.insert((dir, String::from(name)), inode);
        }

        fn mkdir(&mut self, parent: InodeRef, inode: InodeRef, name: &str) {
            self.link(parent, inode, name);
            self.link(inode, inode, ".");
            self.link(inode, parent, "..");
        }
    }

    impl DirectoryReader for Tree {
        fn lookup(&self, dir: InodeRef, name: &str) -> Result<Option<InodeRef>> {
            if self.files.contains(&dir) {
                return Err(FsError::NotADirectory(dir.to_string()));
            }
            Ok(self.entries.get(&(dir, String::from(name))).copied())
        }
    }

    fn sample() -> Tree {
        // /a(1)/b(2), /c(3), /a/f(4) 是普通文件
        let mut tree = Tree::new();
        tree.mkdir(ROOT_INODE, 1, "a");
        tree.mkdir(1, 2, "b");
        tree.mkdir(ROOT_INODE, 3, "c");
        tree.link(1, 4, "f");
        tree.files.push(4);
        tree
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(tokenize("/a//b/"), vec!["a", "b"]);
        assert_eq!(tokenize("a"), vec!["a"]);
        assert!(tokenize("/").is_empty());
        assert!(tokenize("///").is_empty());
        assert_eq!(last_component("/a/b//"), Some("b"));
        assert_eq!(last_component("/"), None);
    }

    #[test]
    fn test_found_under_root() {
        let tree = sample();
        let res = resolve(&tree, "/", "/a").unwrap();
        assert_eq!(res, Lookup::Found { parent: 0, child: 1 });
        let res = resolve(&tree, "/", "c").unwrap();
        assert_eq!(res, Lookup::Found { parent: 0, child: 3 });
    }

    #[test]
    fn test_nested_found_and_not_found() {
        let tree = sample();
        assert_eq!(
            resolve(&tree, "/", "/a/b").unwrap(),
            Lookup::Found { parent: 1, child: 2 }
        );
        assert_eq!(
            resolve(&tree, "/", "/a/x").unwrap(),
            Lookup::NotFound { parent: 1, name: "x" }
        );
    }

    #[test]
    fn test_missing_intermediate_component() {
        let tree = sample();
        let err = resolve(&tree, "/", "/x/y").unwrap_err();
        assert!(matches!(err, FsError::MissingComponent(_)));
        assert_eq!(err.kind(), ErrorKind::Structural);
    }

    #[test]
    fn test_relative_to_working_directory() {
        let tree = sample();
        assert_eq!(
            resolve(&tree, "/a", "b").unwrap(),
            Lookup::Found { parent: 1, child: 2 }
        );
        assert_eq!(
            resolve(&tree, "/a/b", "..").unwrap(),
            Lookup::Found { parent: 2, child: 1 }
        );
        assert_eq!(
            resolve(&tree, "/a/b", "../../c").unwrap(),
            Lookup::Found { parent: 0, child: 3 }
        );
        assert_eq!(
            resolve(&tree, "/a", "new").unwrap(),
            Lookup::NotFound { parent: 1, name: "new" }
        );
        // 绝对路径不从工作目录开始
        assert_eq!(
            resolve(&tree, "/a", "/b").unwrap(),
            Lookup::NotFound { parent: 0, name: "b" }
        );
    }

    #[test]
    fn test_root_and_empty_path() {
        let tree = sample();
        assert!(matches!(resolve(&tree, "/", "/"), Err(FsError::RootNotNamed)));
        assert!(matches!(resolve(&tree, "/", "//"), Err(FsError::RootNotNamed)));
        assert!(matches!(resolve(&tree, "/", ""), Err(FsError::EmptyPath)));
    }

    #[test]
    fn test_invalid_working_directory() {
        let tree = sample();
        let err = resolve(&tree, "/nope", "/a").unwrap_err();
        assert!(matches!(err, FsError::InvalidWorkingDirectory(_)));
        let err = resolve(&tree, "/a/f", "x").unwrap_err();
        assert!(matches!(err, FsError::InvalidWorkingDirectory(_)));
    }

    #[test]
    fn test_walk_through_file() {
        let tree = sample();
        let err = resolve(&tree, "/", "/a/f/x").unwrap_err();
        assert!(matches!(err, FsError::NotADirectory(_)));
        assert_eq!(
            resolve(&tree, "/", "/a/f").unwrap(),
            Lookup::Found { parent: 1, child: 4 }
        );
    }

    #[test]
    fn test_path_too_long() {
        let tree = sample();
        let long = "a/".repeat(MAX_PATH_LENGTH);
        let err = resolve(&tree, "/", &long).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}

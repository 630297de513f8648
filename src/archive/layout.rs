use std::collections::HashMap;

/// Prefix shared by every subpack member
pub const SUBPACKS_PREFIX: &str = "subpacks/";

/// Directory members end in `/` and carry no payload
pub fn is_dir(name: &str) -> bool {
    name.ends_with('/')
}

/// Any member below `subpacks/`
pub fn is_subpack_file(name: &str) -> bool {
    name.starts_with(SUBPACKS_PREFIX)
}

/// A `subpacks/<name>/` directory member (exactly two separators, trailing `/`)
pub fn is_subpack_root(name: &str) -> bool {
    is_subpack_file(name) && is_dir(name) && name.matches('/').count() == 2
}

/// The `subpacks/<name>/` prefix a member lives under, if any
fn subpack_root_of(name: &str) -> Option<&str> {
    let rest = name.strip_prefix(SUBPACKS_PREFIX)?;
    let slash = rest.find('/')?;
    Some(&name[..SUBPACKS_PREFIX.len() + slash + 1])
}

/// Files of one subpack, in archive order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubpackGroup {
    /// Root directory, e.g. `subpacks/swamp/`
    pub root: String,
    /// Full member names of every file below `root`
    pub files: Vec<String>,
}

impl SubpackGroup {
    /// Member name relative to the subpack root
    pub fn relative_path<'a>(&self, name: &'a str) -> &'a str {
        name.strip_prefix(self.root.as_str()).unwrap_or(name)
    }

    /// Archive path of this subpack's contents index
    pub fn index_path(&self) -> String {
        format!("{}{}", self.root, crate::contents::CONTENTS_FILE_NAME)
    }
}

/// Partition of an archive's members into pack structure
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackLayout {
    /// Directory members, copied verbatim
    pub directories: Vec<String>,
    /// Files outside `subpacks/`
    pub root_files: Vec<String>,
    /// One group per subpack root, in order of first appearance
    pub subpacks: Vec<SubpackGroup>,
    /// Files directly under `subpacks/` that belong to no subpack
    pub orphans: Vec<String>,
}

impl PackLayout {
    /// Classify member names, preserving enumeration order.
    ///
    /// Subpack roots come from `subpacks/<name>/` directory members. Archives
    /// zipped without directory entries still get one group per root seen in
    /// file paths; nested `subpacks/` paths below a root stay in that group.
    pub fn classify<S: AsRef<str>>(names: &[S]) -> Self {
        let mut layout = PackLayout::default();
        let mut group_index: HashMap<String, usize> = HashMap::new();

        let mut group_for = |layout: &mut PackLayout, root: &str| -> usize {
            *group_index.entry(root.to_string()).or_insert_with(|| {
                layout.subpacks.push(SubpackGroup {
                    root: root.to_string(),
                    files: Vec::new(),
                });
                layout.subpacks.len() - 1
            })
        };

        for name in names {
            let name = name.as_ref();

            if is_dir(name) {
                layout.directories.push(name.to_string());
                if is_subpack_root(name) {
                    group_for(&mut layout, name);
                }
                continue;
            }

            if !is_subpack_file(name) {
                layout.root_files.push(name.to_string());
                continue;
            }

            match subpack_root_of(name) {
                Some(root) => {
                    let idx = group_for(&mut layout, root);
                    layout.subpacks[idx].files.push(name.to_string());
                }
                None => layout.orphans.push(name.to_string()),
            }
        }

        layout
    }

    pub fn subpack_file_count(&self) -> usize {
        self.subpacks.iter().map(|g| g.files.len()).sum()
    }

    /// Progress units: every file plus one index per pack and subpack
    pub fn total_units(&self) -> usize {
        self.root_files.len() + self.subpack_file_count() + 1 + self.subpacks.len()
    }
}

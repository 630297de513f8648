mod layout;
mod reader;
mod writer;

pub use layout::{
    is_dir, is_subpack_file, is_subpack_root, PackLayout, SubpackGroup, SUBPACKS_PREFIX,
};
pub use reader::PackReader;
pub use writer::PackWriter;

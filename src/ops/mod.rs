pub mod checkout;
pub mod commit_tree;
pub mod fsck;
pub mod ls_tree;
pub mod write_tree;

pub use checkout::checkout;
pub use commit_tree::commit_tree;
pub use fsck::{fsck, FsckReport};
pub use ls_tree::ls_tree;
pub use write_tree::write_tree;

pub mod tree_list;
pub mod tree_view;
pub mod ui;

pub use tree_list::TreeList;

//! Domain layer: tree, path grammar, values and descriptors
//!
//! This layer is independent of external concerns (no type resolution, no
//! construction, no config loading).

pub mod builtin;
pub mod component;
pub mod error;
pub mod obtain;
pub mod path;
pub mod plugin;
pub mod property;
pub mod tree;
pub mod value;

pub use builtin::{Builtin, BuiltinType, CachePolicy, ConstructorArgument};
pub use component::{
    find_member, ApplicationModule, Component, Member, MemberType, ServiceKey, ServiceProvider,
};
pub use error::{DomainError, DomainResult};
pub use obtain::ObtainMode;
pub use path::{prepare_path_text, PathExpression, Segment};
pub use plugin::Plugin;
pub use property::{ExtendedProperty, PropertyCollection};
pub use tree::{next_anonymous_id, NodeId, NodeType, NodeValue, PluginTree, TreeNode};
pub use value::{Shape, Value, ValueKind};

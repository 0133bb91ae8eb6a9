use std::collections::HashMap;

use crate::target::{Target, TargetName};

/// Newtype for target nodes in the arena.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct TargetNode(usize);

/// Owns all [`Target`]s and maps normalized target names to nodes. Provides operations to register and look up
/// targets.
///
/// Re-registering a name overwrites the mapping; the previous node stays in the arena but is no longer reachable by
/// name.
#[derive(Default)]
pub struct Store {
  targets: Vec<Target>,
  name_to_node: HashMap<TargetName, TargetNode>,
}

impl Store {
  /// Registers `target` under its normalized name, returning its node.
  pub fn register(&mut self, target: Target) -> TargetNode {
    let node = TargetNode(self.targets.len());
    self.name_to_node.insert(target.name.clone(), node);
    self.targets.push(target);
    node
  }

  /// Gets the node registered under `name`, or `None` if no target is registered under it.
  #[inline]
  pub fn lookup(&self, name: &TargetName) -> Option<TargetNode> {
    self.name_to_node.get(name).copied()
  }

  /// Gets the target for `node`.
  ///
  /// # Panics
  ///
  /// Panics if `node` was not found in the store.
  #[inline]
  pub fn target(&self, node: TargetNode) -> &Target {
    let Some(target) = self.targets.get(node.0) else {
      panic!("BUG: node {:?} was not found in the store", node);
    };
    target
  }

  /// Gets the target for `node`, mutably.
  ///
  /// # Panics
  ///
  /// Panics if `node` was not found in the store.
  #[inline]
  pub fn target_mut(&mut self, node: TargetNode) -> &mut Target {
    let Some(target) = self.targets.get_mut(node.0) else {
      panic!("BUG: node {:?} was not found in the store", node);
    };
    target
  }

  /// Lists all registered targets with their help strings, sorted by name.
  pub fn listing(&self) -> Vec<(String, String)> {
    let mut listing: Vec<_> = self.name_to_node.iter()
      .map(|(name, node)| {
        let help = self.target(*node).help.clone().unwrap_or_default();
        (name.as_str().to_string(), help)
      })
      .collect();
    listing.sort();
    listing
  }
}


#[cfg(test)]
mod test {
  use crate::target::TargetKind;

  use super::*;

  #[test]
  fn test_register_and_lookup_normalized() {
    let mut store = Store::default();
    let node = store.register(Target::new("build\\a.o", TargetKind::Compile));
    // Registered with backslashes, looked up with forward slashes: same node.
    assert_eq!(store.lookup(&TargetName::new("build/a.o")), Some(node));
    assert_eq!(store.lookup(&TargetName::new("build\\a.o")), Some(node));
    assert_eq!(store.lookup(&TargetName::new("missing")), None);
  }

  #[test]
  fn test_re_registration_overwrites() {
    let mut store = Store::default();
    let first = store.register(Target::new("app", TargetKind::Link));
    let second = store.register(Target::new("app", TargetKind::Link));
    assert_ne!(first, second);
    assert_eq!(store.lookup(&TargetName::new("app")), Some(second));
  }

  #[test]
  fn test_listing() {
    let mut store = Store::default();
    let mut target = Target::new("app", TargetKind::Link);
    target.help = Some("firmware image".to_string());
    store.register(target);
    store.register(Target::new("#phony_all", TargetKind::Phony));
    let listing = store.listing();
    assert_eq!(listing, vec![
      ("#phony_all".to_string(), String::new()),
      ("app".to_string(), "firmware image".to_string()),
    ]);
  }
}

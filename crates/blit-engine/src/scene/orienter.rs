use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::math::{Mat4, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrienterError {
    /// Attaching would make a node its own ancestor.
    Cycle,
}

impl fmt::Display for OrienterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrienterError::Cycle => write!(f, "orienter parent chain would form a cycle"),
        }
    }
}

impl std::error::Error for OrienterError {}

#[derive(Default)]
struct Node {
    pos: Cell<Vec3>,
    rot: Cell<f32>,
    parent: RefCell<Weak<Node>>,
}

/// Position and z-rotation, optionally relative to a parent.
///
/// Cloning yields another handle to the same node. The parent link is weak:
/// once every handle to a parent is gone its children behave as roots.
#[derive(Clone, Default)]
pub struct Orienter {
    node: Rc<Node>,
}

impl Orienter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(pos: Vec3) -> Self {
        let o = Self::new();
        o.set_local_pos(pos);
        o
    }

    pub fn local_pos(&self) -> Vec3 {
        self.node.pos.get()
    }

    pub fn set_local_pos(&self, pos: Vec3) {
        self.node.pos.set(pos);
    }

    pub fn translate(&self, delta: Vec3) {
        self.node.pos.set(self.node.pos.get() + delta);
    }

    /// Local rotation about +Z, radians.
    pub fn local_rot(&self) -> f32 {
        self.node.rot.get()
    }

    pub fn set_local_rot(&self, rad: f32) {
        self.node.rot.set(rad);
    }

    pub fn rotate(&self, rad: f32) {
        self.node.rot.set(self.node.rot.get() + rad);
    }

    pub fn parent(&self) -> Option<Orienter> {
        self.node.parent.borrow().upgrade().map(|node| Orienter { node })
    }

    /// Attaches to `parent`, or detaches with `None`.
    ///
    /// Fails without changing anything if `parent` is this node or one of
    /// its descendants.
    pub fn set_parent(&self, parent: Option<&Orienter>) -> Result<(), OrienterError> {
        let Some(parent) = parent else {
            *self.node.parent.borrow_mut() = Weak::new();
            return Ok(());
        };

        let mut cursor = Some(parent.clone());
        while let Some(o) = cursor {
            if o.ptr_eq(self) {
                return Err(OrienterError::Cycle);
            }
            cursor = o.parent();
        }

        *self.node.parent.borrow_mut() = Rc::downgrade(&parent.node);
        Ok(())
    }

    pub fn ptr_eq(&self, other: &Orienter) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }

    /// Chain of nodes from this one up to the root.
    fn ancestry(&self) -> impl Iterator<Item = Orienter> {
        std::iter::successors(Some(self.clone()), Orienter::parent)
    }

    /// World position: local positions summed up the parent chain.
    pub fn pos(&self) -> Vec3 {
        self.ancestry().fold(Vec3::ZERO, |acc, o| acc + o.local_pos())
    }

    /// World rotation: local rotations summed up the parent chain.
    pub fn rot(&self) -> f32 {
        self.ancestry().map(|o| o.local_rot()).sum()
    }

    /// Model matrix: translate to [`pos`](Self::pos), then rotate by [`rot`](Self::rot).
    pub fn mat(&self) -> Mat4 {
        Mat4::translation(self.pos()) * Mat4::rotation_z(self.rot())
    }
}

impl fmt::Debug for Orienter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orienter")
            .field("pos", &self.local_pos())
            .field("rot", &self.local_rot())
            .field("has_parent", &self.parent().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn at(x: f32, y: f32) -> Orienter {
        Orienter::at(Vec3::new(x, y, 0.0))
    }

    #[test]
    fn chain_composes_positions() {
        let root = at(1.0, 0.0);
        let mid = at(0.0, 2.0);
        let leaf = at(3.0, 0.0);
        mid.set_parent(Some(&root)).unwrap();
        leaf.set_parent(Some(&mid)).unwrap();

        assert_eq!(leaf.pos(), Vec3::new(4.0, 2.0, 0.0));
        assert_eq!(mid.pos(), Vec3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn rotation_sums_and_feeds_matrix() {
        let root = at(0.0, 0.0);
        let child = at(2.0, 0.0);
        child.set_parent(Some(&root)).unwrap();
        root.set_local_rot(0.25);
        child.rotate(0.5);
        assert_relative_eq!(child.rot(), 0.75);

        let m = child.mat();
        let origin = m.transform_point(Vec3::ZERO);
        assert_relative_eq!(origin.x, 2.0);
        assert_relative_eq!(origin.y, 0.0);
    }

    #[test]
    fn cycles_are_rejected() {
        let a = at(0.0, 0.0);
        let b = at(0.0, 0.0);
        let c = at(0.0, 0.0);
        b.set_parent(Some(&a)).unwrap();
        c.set_parent(Some(&b)).unwrap();

        assert_eq!(a.set_parent(Some(&c)), Err(OrienterError::Cycle));
        assert_eq!(a.set_parent(Some(&a)), Err(OrienterError::Cycle));
        assert!(a.parent().is_none());
    }

    #[test]
    fn detach_and_dropped_parent() {
        let child = at(1.0, 1.0);
        {
            let parent = at(5.0, 0.0);
            child.set_parent(Some(&parent)).unwrap();
            assert_eq!(child.pos(), Vec3::new(6.0, 1.0, 0.0));
            child.set_parent(None).unwrap();
            assert_eq!(child.pos(), Vec3::new(1.0, 1.0, 0.0));
            child.set_parent(Some(&parent)).unwrap();
        }
        assert!(child.parent().is_none());
        assert_eq!(child.pos(), Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn clones_share_state() {
        let a = at(0.0, 0.0);
        let b = a.clone();
        b.translate(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(a.local_pos(), Vec3::new(1.0, 2.0, 3.0));
        assert!(a.ptr_eq(&b));
    }
}

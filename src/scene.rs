//! Retained scene graph.
//!
//! Nodes live in a slot arena and reference each other by [`NodeKey`]. Every
//! node carries a local [`Transform`]; world matrices are composed from the
//! roots down when drawing or picking.

use glam::{EulerRot, Mat3, Mat4, Quat, Vec3};
use slotmap::{new_key_type, SlotMap};
use thiserror::Error;

use crate::color::Color;
use crate::geometry::{Bounds, MeshId, MeshStore};
use crate::material::Material;
use crate::texture::{TextureId, TextureStore};

new_key_type! {
    pub struct NodeKey;
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SceneError {
    #[error("unknown scene node {0:?}")]
    UnknownNode(NodeKey),
    #[error("unknown mesh {0:?}")]
    UnknownMesh(MeshId),
    #[error("unknown texture {0:?}")]
    UnknownTexture(TextureId),
}

/// Local transform. Rotation is Euler angles in radians applied as
/// `Rx * Ry * Rz`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn quat(&self) -> Quat {
        Quat::from_euler(
            EulerRot::XYZ,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        )
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.quat(), self.position)
    }
}

/// Name and description shown when a node is clicked.
#[derive(Debug, Clone, PartialEq)]
pub struct PickInfo {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Group,
    Mesh { mesh: MeshId, material: Material },
}

#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub transform: Transform,
    pub visible: bool,
    pub pick: Option<PickInfo>,
    pub kind: NodeKind,
    parent: Option<NodeKey>,
    children: Vec<NodeKey>,
}

impl Node {
    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }

    pub fn material(&self) -> Option<&Material> {
        match &self.kind {
            NodeKind::Mesh { material, .. } => Some(material),
            NodeKind::Group => None,
        }
    }

    pub fn material_mut(&mut self) -> Option<&mut Material> {
        match &mut self.kind {
            NodeKind::Mesh { material, .. } => Some(material),
            NodeKind::Group => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientLight {
    pub color: Color,
    pub intensity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub color: Color,
    pub intensity: f32,
    /// The light shines from this point toward the origin.
    pub position: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub color: Color,
    pub intensity: f32,
    pub position: Vec3,
    /// Distance at which the light has faded out completely.
    pub range: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Lights {
    pub ambient: Option<AmbientLight>,
    pub directional: Option<DirectionalLight>,
    pub point: Option<PointLight>,
}

/// One mesh node ready to be drawn.
#[derive(Debug, Clone)]
pub struct DrawItem<'a> {
    pub key: NodeKey,
    pub mesh: MeshId,
    pub material: &'a Material,
    pub model: Mat4,
}

#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: SlotMap<NodeKey, Node>,
    roots: Vec<NodeKey>,
    pub meshes: MeshStore,
    pub textures: TextureStore,
    pub lights: Lights,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_group(
        &mut self,
        parent: Option<NodeKey>,
        name: impl Into<String>,
        transform: Transform,
    ) -> Result<NodeKey, SceneError> {
        self.insert(parent, name.into(), transform, NodeKind::Group)
    }

    pub fn add_mesh(
        &mut self,
        parent: Option<NodeKey>,
        name: impl Into<String>,
        transform: Transform,
        mesh: MeshId,
        material: Material,
    ) -> Result<NodeKey, SceneError> {
        if self.meshes.get(mesh).is_none() {
            return Err(SceneError::UnknownMesh(mesh));
        }
        if let Some(texture) = material.texture {
            if self.textures.get(texture).is_none() {
                return Err(SceneError::UnknownTexture(texture));
            }
        }
        self.insert(
            parent,
            name.into(),
            transform,
            NodeKind::Mesh { mesh, material },
        )
    }

    fn insert(
        &mut self,
        parent: Option<NodeKey>,
        name: String,
        transform: Transform,
        kind: NodeKind,
    ) -> Result<NodeKey, SceneError> {
        if let Some(parent) = parent {
            if !self.nodes.contains_key(parent) {
                return Err(SceneError::UnknownNode(parent));
            }
        }
        let key = self.nodes.insert(Node {
            name,
            transform,
            visible: true,
            pick: None,
            kind,
            parent,
            children: Vec::new(),
        });
        match parent.and_then(|parent| self.nodes.get_mut(parent)) {
            Some(parent) => parent.children.push(key),
            None => self.roots.push(key),
        }
        Ok(key)
    }

    pub fn set_pick(
        &mut self,
        key: NodeKey,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<(), SceneError> {
        self.node_mut(key)?.pick = Some(PickInfo {
            name: name.into(),
            description: description.into(),
        });
        Ok(())
    }

    /// Removes a node and its whole subtree.
    pub fn remove(&mut self, key: NodeKey) -> Result<(), SceneError> {
        let parent = self.node(key)?.parent;
        match parent.and_then(|parent| self.nodes.get_mut(parent)) {
            Some(parent) => parent.children.retain(|child| *child != key),
            None => self.roots.retain(|root| *root != key),
        }
        let mut pending = vec![key];
        while let Some(next) = pending.pop() {
            if let Some(node) = self.nodes.remove(next) {
                pending.extend(node.children);
            }
        }
        Ok(())
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.nodes.contains_key(key)
    }

    pub fn node(&self, key: NodeKey) -> Result<&Node, SceneError> {
        self.nodes.get(key).ok_or(SceneError::UnknownNode(key))
    }

    pub fn node_mut(&mut self, key: NodeKey) -> Result<&mut Node, SceneError> {
        self.nodes.get_mut(key).ok_or(SceneError::UnknownNode(key))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn world_matrix(&self, key: NodeKey) -> Result<Mat4, SceneError> {
        let mut node = self.node(key)?;
        let mut matrix = node.transform.matrix();
        while let Some(parent) = node.parent {
            node = self.node(parent)?;
            matrix = node.transform.matrix() * matrix;
        }
        Ok(matrix)
    }

    pub fn world_position(&self, key: NodeKey) -> Result<Vec3, SceneError> {
        Ok(self.world_matrix(key)?.w_axis.truncate())
    }

    /// A node is drawn only when it and all its ancestors are visible.
    pub fn is_visible_in_tree(&self, key: NodeKey) -> Result<bool, SceneError> {
        let mut current = Some(key);
        while let Some(next) = current {
            let node = self.node(next)?;
            if !node.visible {
                return Ok(false);
            }
            current = node.parent;
        }
        Ok(true)
    }

    /// Rotates a node so its local +Z axis points at a world-space target.
    pub fn look_at(&mut self, key: NodeKey, target: Vec3) -> Result<(), SceneError> {
        let position = self.world_position(key)?;
        let forward = target - position;
        if forward.length_squared() <= f32::EPSILON {
            return Ok(());
        }
        let z = forward.normalize();
        let mut x = Vec3::Y.cross(z);
        if x.length_squared() <= f32::EPSILON {
            x = Vec3::X;
        }
        let x = x.normalize();
        let y = z.cross(x);
        let world = Quat::from_mat3(&Mat3::from_cols(x, y, z));

        let parent_rotation = match self.node(key)?.parent {
            Some(parent) => {
                let (_, rotation, _) = self.world_matrix(parent)?.to_scale_rotation_translation();
                rotation
            }
            None => Quat::IDENTITY,
        };
        let local = parent_rotation.inverse() * world;
        let (rx, ry, rz) = local.to_euler(EulerRot::XYZ);
        self.node_mut(key)?.transform.rotation = Vec3::new(rx, ry, rz);
        Ok(())
    }

    /// Depth-first walk from the roots yielding each node with its world
    /// matrix. Hidden subtrees are skipped when `visible_only` is set.
    fn walk(&self, visible_only: bool) -> Vec<(NodeKey, Mat4)> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<(NodeKey, Mat4)> = self
            .roots
            .iter()
            .rev()
            .map(|root| (*root, Mat4::IDENTITY))
            .collect();
        while let Some((key, parent_matrix)) = stack.pop() {
            let Some(node) = self.nodes.get(key) else {
                continue;
            };
            if visible_only && !node.visible {
                continue;
            }
            let world = parent_matrix * node.transform.matrix();
            out.push((key, world));
            stack.extend(node.children.iter().rev().map(|child| (*child, world)));
        }
        out
    }

    /// Pickable nodes in tree order.
    pub fn pickables(&self) -> Vec<NodeKey> {
        self.walk(false)
            .into_iter()
            .map(|(key, _)| key)
            .filter(|key| self.nodes[*key].pick.is_some())
            .collect()
    }

    /// Visible mesh nodes that stop a pointer ray, with their world matrix
    /// and local bounds: every pickable node plus opaque meshes with bounds.
    /// Transparent shells such as glows and hazes let rays through.
    pub fn visible_bounds(&self) -> Vec<(NodeKey, Mat4, Bounds)> {
        self.walk(true)
            .into_iter()
            .filter_map(|(key, world)| {
                let node = &self.nodes[key];
                let NodeKind::Mesh { mesh, material } = &node.kind else {
                    return None;
                };
                if node.pick.is_none() && material.is_transparent() {
                    return None;
                }
                let bounds = self.meshes.get(*mesh)?.bounds;
                if bounds == Bounds::None {
                    return None;
                }
                Some((key, world, bounds))
            })
            .collect()
    }

    pub fn find_pickable(&self, name: &str) -> Option<NodeKey> {
        self.pickables().into_iter().find(|key| {
            self.nodes[*key]
                .pick
                .as_ref()
                .is_some_and(|pick| pick.name.eq_ignore_ascii_case(name))
        })
    }

    pub fn pick_info(&self, key: NodeKey) -> Option<&PickInfo> {
        self.nodes.get(key)?.pick.as_ref()
    }

    /// Visible mesh nodes: opaque ones in tree order, then transparent ones
    /// sorted far to near from `eye`.
    pub fn draw_list(&self, eye: Vec3) -> Vec<DrawItem<'_>> {
        let mut opaque = Vec::new();
        let mut transparent = Vec::new();
        for (key, model) in self.walk(true) {
            let NodeKind::Mesh { mesh, material } = &self.nodes[key].kind else {
                continue;
            };
            let item = DrawItem {
                key,
                mesh: *mesh,
                material,
                model,
            };
            if material.is_transparent() {
                let distance = model.w_axis.truncate().distance_squared(eye);
                transparent.push((distance, item));
            } else {
                opaque.push(item);
            }
        }
        transparent.sort_by(|a, b| b.0.total_cmp(&a.0));
        opaque.extend(transparent.into_iter().map(|(_, item)| item));
        opaque
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry;
    use std::f32::consts::FRAC_PI_2;

    fn graph_with_sphere() -> (SceneGraph, MeshId) {
        let mut graph = SceneGraph::new();
        let mesh = graph.meshes.insert(geometry::sphere(1.0, 8, 6));
        (graph, mesh)
    }

    #[test]
    fn world_matrix_composes_parents() {
        let (mut graph, mesh) = graph_with_sphere();
        let orbit = graph
            .add_group(None, "orbit", Transform::default().with_rotation(Vec3::new(0.0, FRAC_PI_2, 0.0)))
            .unwrap();
        let planet = graph
            .add_mesh(
                Some(orbit),
                "planet",
                Transform::at(Vec3::new(10.0, 0.0, 0.0)),
                mesh,
                Material::default(),
            )
            .unwrap();
        let world = graph.world_position(planet).unwrap();
        assert!((world - Vec3::new(0.0, 0.0, -10.0)).length() < 1e-4);
    }

    #[test]
    fn hidden_ancestor_hides_subtree() {
        let (mut graph, mesh) = graph_with_sphere();
        let parent = graph
            .add_mesh(None, "planet", Transform::default(), mesh, Material::default())
            .unwrap();
        let child = graph
            .add_mesh(Some(parent), "moon", Transform::default(), mesh, Material::default())
            .unwrap();
        graph.set_pick(child, "Moon", "small").unwrap();
        assert!(graph.is_visible_in_tree(child).unwrap());
        assert_eq!(graph.visible_bounds().len(), 2);

        graph.node_mut(parent).unwrap().visible = false;
        assert!(!graph.is_visible_in_tree(child).unwrap());
        assert!(graph.visible_bounds().is_empty());
        assert!(graph.draw_list(Vec3::ZERO).is_empty());
        assert_eq!(graph.pickables(), vec![child]);
    }

    #[test]
    fn remove_drops_whole_subtree() {
        let (mut graph, mesh) = graph_with_sphere();
        let group = graph.add_group(None, "explosion", Transform::default()).unwrap();
        for i in 0..5 {
            graph
                .add_mesh(Some(group), format!("p{i}"), Transform::default(), mesh, Material::default())
                .unwrap();
        }
        assert_eq!(graph.len(), 6);
        graph.remove(group).unwrap();
        assert!(graph.is_empty());
        assert_eq!(graph.remove(group), Err(SceneError::UnknownNode(group)));
    }

    #[test]
    fn unknown_parent_is_rejected() {
        let (mut graph, _) = graph_with_sphere();
        let key = graph.add_group(None, "gone", Transform::default()).unwrap();
        graph.remove(key).unwrap();
        assert_eq!(
            graph.add_group(Some(key), "child", Transform::default()),
            Err(SceneError::UnknownNode(key))
        );
    }

    #[test]
    fn draw_list_puts_transparent_last_far_first() {
        let (mut graph, mesh) = graph_with_sphere();
        let glass = Material::basic(Color::WHITE).with_opacity(0.5);
        let near = graph
            .add_mesh(None, "near", Transform::at(Vec3::new(0.0, 0.0, 1.0)), mesh, glass.clone())
            .unwrap();
        let far = graph
            .add_mesh(None, "far", Transform::at(Vec3::new(0.0, 0.0, -5.0)), mesh, glass)
            .unwrap();
        let solid = graph
            .add_mesh(None, "solid", Transform::default(), mesh, Material::default())
            .unwrap();
        let order: Vec<NodeKey> = graph
            .draw_list(Vec3::new(0.0, 0.0, 10.0))
            .iter()
            .map(|item| item.key)
            .collect();
        assert_eq!(order, vec![solid, far, near]);
    }

    #[test]
    fn look_at_points_local_z_at_target() {
        let (mut graph, _) = graph_with_sphere();
        let comet = graph
            .add_group(None, "comet", Transform::at(Vec3::new(30.0, 2.0, 10.0)))
            .unwrap();
        graph.look_at(comet, Vec3::ZERO).unwrap();
        let world = graph.world_matrix(comet).unwrap();
        let forward = world.transform_vector3(Vec3::Z).normalize();
        let expected = (Vec3::ZERO - Vec3::new(30.0, 2.0, 10.0)).normalize();
        assert!(forward.dot(expected) > 0.999);
    }

    #[test]
    fn find_pickable_ignores_case() {
        let (mut graph, mesh) = graph_with_sphere();
        let mars = graph
            .add_mesh(None, "mars", Transform::default(), mesh, Material::default())
            .unwrap();
        graph.set_pick(mars, "Mars", "red").unwrap();
        assert_eq!(graph.find_pickable("mars"), Some(mars));
        assert_eq!(graph.find_pickable("Venus"), None);
    }
}

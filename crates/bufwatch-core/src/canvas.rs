#![forbid(unsafe_code)]

//! Mounted surfaces and their geometry, keyed by relation.

use std::collections::HashMap;

use crate::color::Rgba;
use crate::entity::EntityId;
use crate::grid::GridGeometry;
use crate::surface::Surface;

/// A host surface together with the geometry it was initialized with.
#[derive(Debug)]
pub struct Canvas<S> {
    surface: S,
    geometry: GridGeometry,
}

impl<S: Surface> Canvas<S> {
    #[must_use]
    pub fn new(surface: S, geometry: GridGeometry) -> Self {
        Self { surface, geometry }
    }

    #[must_use]
    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    #[must_use]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Give the surface back to the host.
    #[must_use]
    pub fn into_surface(self) -> S {
        self.surface
    }

    /// Paint one block's cell.
    pub fn paint_block(&mut self, block: u32, color: Rgba) {
        let rect = self.geometry.cell_rect(block);
        self.surface.fill_rect(rect, color);
    }
}

/// Every surface currently mounted in a session.
#[derive(Debug)]
pub struct CanvasSet<S> {
    canvases: HashMap<EntityId, Canvas<S>>,
}

impl<S> Default for CanvasSet<S> {
    fn default() -> Self {
        Self {
            canvases: HashMap::new(),
        }
    }
}

impl<S: Surface> CanvasSet<S> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the canvas for `id`, returning the previous one.
    pub fn insert(&mut self, id: EntityId, canvas: Canvas<S>) -> Option<Canvas<S>> {
        self.canvases.insert(id, canvas)
    }

    pub fn remove(&mut self, id: EntityId) -> Option<Canvas<S>> {
        self.canvases.remove(&id)
    }

    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Canvas<S>> {
        self.canvases.get(&id)
    }

    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.canvases.contains_key(&id)
    }

    /// Geometry of the mounted canvas for `id`, if any.
    #[must_use]
    pub fn geometry(&self, id: EntityId) -> Option<&GridGeometry> {
        self.canvases.get(&id).map(Canvas::geometry)
    }

    /// Paint `block` of `id`. Returns `false` (and paints nothing) when no
    /// canvas is mounted for `id`.
    pub fn paint_block(&mut self, id: EntityId, block: u32, color: Rgba) -> bool {
        match self.canvases.get_mut(&id) {
            Some(canvas) => {
                canvas.paint_block(block, color);
                true
            }
            None => false,
        }
    }

    /// Mounted relation ids, in no particular order.
    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.canvases.keys().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.canvases.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.canvases.is_empty()
    }

    /// Remove every canvas, returning how many were mounted.
    pub fn clear(&mut self) -> usize {
        let released = self.canvases.len();
        self.canvases.clear();
        released
    }
}

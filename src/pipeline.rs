use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Context, Result};
use glam::{Mat4, Vec3, Vec4};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::bounds::OBBox;
use crate::clipper::{VertexBuffer, clip_triangle};
use crate::culler::classify_obbox;
use crate::frustum::CullResult;
use crate::mesh::Mesh;
use crate::render_target::RenderTarget;
use crate::triangle::{ScreenTriangle, Triangle};
use crate::world::World;
use crate::world_object::WorldObject;

/// Per-frame counters, one per pipeline stage.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct FrameStats {
    /// Objects surviving the quadtree walk (both lists).
    pub objects_after_prune: usize,
    pub objects_inside_after_prune: usize,
    pub objects_needing_box_culling: usize,
    pub objects_needing_clipping: usize,
    pub objects_inside_after_box_culling: usize,
    pub vertices_from_objects: usize,
    pub triangles_from_objects: usize,
    pub front_facing_triangles: usize,
    pub triangles_sent_to_clip: usize,
    pub triangles_sent_to_render: usize,
}

#[derive(Default)]
struct StatCounters {
    vertices_from_objects: AtomicUsize,
    triangles_from_objects: AtomicUsize,
    front_facing_triangles: AtomicUsize,
    triangles_sent_to_clip: AtomicUsize,
    triangles_sent_to_render: AtomicUsize,
}

impl StatCounters {
    fn add(counter: &AtomicUsize, n: usize) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    fn fill(&self, stats: &mut FrameStats) {
        stats.vertices_from_objects = self.vertices_from_objects.load(Ordering::Relaxed);
        stats.triangles_from_objects = self.triangles_from_objects.load(Ordering::Relaxed);
        stats.front_facing_triangles = self.front_facing_triangles.load(Ordering::Relaxed);
        stats.triangles_sent_to_clip = self.triangles_sent_to_clip.load(Ordering::Relaxed);
        stats.triangles_sent_to_render = self.triangles_sent_to_render.load(Ordering::Relaxed);
    }
}

/// Front-facing triangles of `mesh` as seen from `camera_local` (the camera
/// position in the mesh's local space), each lit by the cosine between its
/// normal and the direction to the camera, plus a mask of the vertices they
/// use.
pub fn cull_backfaces(mesh: &Mesh, camera_local: Vec3) -> (Vec<Triangle>, Vec<bool>) {
    let vertices = mesh.vertices();
    let mut needed = vec![false; vertices.len()];
    let mut front = Vec::new();
    for (triangle, normal) in mesh.triangles().iter().zip(mesh.normals()) {
        let [a, b, c] = triangle.indices;
        let barycenter = (vertices[a] + vertices[b] + vertices[c]) / 3.0;
        let to_camera = (camera_local - barycenter).normalize_or_zero();
        let facing = to_camera.dot(*normal);
        if facing > 0.0 {
            front.push(triangle.with_light(facing.min(1.0)));
            for i in triangle.indices {
                needed[i] = true;
            }
        }
    }
    (front, needed)
}

/// Clip-space positions of the needed vertices. Unneeded slots are kept so
/// mesh indices stay valid.
pub fn transform_vertices(mesh: &Mesh, needed: &[bool], local_to_proj: &Mat4) -> VertexBuffer {
    let mut buffer = VertexBuffer::with_capacity(mesh.vertex_count() + 16);
    for (v, &used) in mesh.vertices().iter().zip(needed) {
        if used {
            buffer.push(*local_to_proj * v.extend(1.0));
        } else {
            buffer.push_unused();
        }
    }
    buffer
}

/// Perspective divide plus viewport transform. Texels become
/// `(u/w, v/w, 1/w)` so they interpolate linearly on screen.
pub fn project_to_screen(triangle: &Triangle, vertices: &VertexBuffer, viewport: &Mat4) -> ScreenTriangle {
    let mut points = [Vec3::ZERO; 3];
    let mut texels = [Vec3::ZERO; 3];
    for k in 0..3 {
        let clip = vertices.position(triangle.indices[k]);
        let inv_w = 1.0 / clip.w;
        let ndc = Vec4::new(clip.x * inv_w, clip.y * inv_w, clip.z * inv_w, 1.0);
        points[k] = (*viewport * ndc).truncate();
        texels[k] = triangle.texels[k] * inv_w;
    }
    ScreenTriangle { points, texels, light: triangle.light }
}

/// Owns the worker pool that rasterizes frames.
pub struct Renderer {
    pool: ThreadPool,
}

impl Renderer {
    /// `threads == 0` uses one thread per logical core.
    pub fn new(threads: usize) -> Result<Self> {
        let threads = if threads == 0 { num_cpus::get() } else { threads };
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("raster-{i}"))
            .build()
            .context("failed to build render thread pool")?;
        log::info!("renderer using {threads} threads");
        Ok(Self { pool })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Render every visible object of `world` into `target`. The target is
    /// not cleared here.
    pub fn render_frame(&self, world: &World, target: &RenderTarget) -> FrameStats {
        let camera = world.camera();
        let world_to_proj = camera.world_to_projection();
        let viewport = camera.viewport();
        let camera_position = camera.position();
        let objects = world.objects();

        let mut needs_culling = Vec::new();
        let mut ready = Vec::new();
        world.culler().fill_cull_and_render_lists(
            world.quadtree(),
            &world_to_proj,
            |id| objects[id].world_bounds(),
            &mut needs_culling,
            &mut ready,
        );

        let mut stats = FrameStats {
            objects_after_prune: needs_culling.len() + ready.len(),
            objects_inside_after_prune: ready.len(),
            objects_needing_box_culling: needs_culling.len(),
            ..FrameStats::default()
        };

        // (object, needs clipping)
        let mut jobs: Vec<(usize, bool)> = ready.iter().map(|&id| (id, false)).collect();
        for &id in &needs_culling {
            let object = &objects[id];
            let clip_box = OBBox::from(object.mesh().bounds()).transform(&(world_to_proj * object.local_to_world()));
            match classify_obbox(&clip_box) {
                CullResult::Outside => {}
                CullResult::Inside => {
                    stats.objects_inside_after_box_culling += 1;
                    jobs.push((id, false));
                }
                CullResult::Partial => {
                    stats.objects_needing_clipping += 1;
                    jobs.push((id, true));
                }
            }
        }

        let counters = StatCounters::default();
        self.pool.install(|| {
            jobs.par_iter().for_each(|&(id, clip)| {
                render_object(&objects[id], camera_position, &world_to_proj, &viewport, clip, target, &counters);
            });
        });
        counters.fill(&mut stats);
        log::debug!("{stats:?}");
        stats
    }
}

fn render_object(
    object: &WorldObject,
    camera_position: Vec3,
    world_to_proj: &Mat4,
    viewport: &Mat4,
    clip: bool,
    target: &RenderTarget,
    counters: &StatCounters,
) {
    let mesh = object.mesh();
    StatCounters::add(&counters.vertices_from_objects, mesh.vertex_count());
    StatCounters::add(&counters.triangles_from_objects, mesh.triangle_count());

    let camera_local = object.world_to_local().transform_point3(camera_position);
    let (front, needed) = cull_backfaces(mesh, camera_local);
    StatCounters::add(&counters.front_facing_triangles, front.len());
    if front.is_empty() {
        return;
    }

    let local_to_proj = *world_to_proj * object.local_to_world();
    let mut vertices = transform_vertices(mesh, &needed, &local_to_proj);

    let triangles = if clip {
        StatCounters::add(&counters.triangles_sent_to_clip, front.len());
        let mut clipped = Vec::with_capacity(front.len());
        for t in front {
            clipped.extend(clip_triangle(t, &mut vertices));
        }
        clipped
    } else {
        front
    };
    StatCounters::add(&counters.triangles_sent_to_render, triangles.len());

    let texture = object.texture();
    triangles.par_iter().for_each(|t| {
        target.render_triangle(&project_to_screen(t, &vertices, viewport), texture);
    });
}

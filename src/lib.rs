//! A CPU-only 3-D rendering pipeline: camera and object transforms,
//! quadtree broad-phase culling, frustum clipping and a multithreaded
//! scanline rasterizer with perspective-correct texturing.

pub mod accumulator;
pub mod bounds;
pub mod camera;
pub mod clipper;
pub mod config;
pub mod controls;
pub mod culler;
pub mod frame_loop;
pub mod frustum;
pub mod mesh;
pub mod octree;
pub mod pipeline;
pub mod quadtree;
pub mod render_target;
pub mod texture;
pub mod triangle;
pub mod world;
pub mod world_object;

pub use camera::Camera;
pub use config::EngineConfig;
pub use controls::{Axis, Controls};
pub use frame_loop::{ChannelSink, Command, FixedClock, Frame, FrameClock, PresentationSink, RenderWorker, SystemClock, WorkerParts};
pub use mesh::{Face, Mesh};
pub use pipeline::{FrameStats, Renderer};
pub use render_target::RenderTarget;
pub use texture::Texture;
pub use world::World;
pub use world_object::WorldObject;

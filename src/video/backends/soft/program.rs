//! The fragment programs of the software backend.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::math::prelude::*;
use crate::oit::abuffer::{self, Node};
use crate::oit::visibility::{self, VisibilityCurve};
use crate::oit::{self, weighted};
use crate::utils::prelude::HashValue;
use crate::video::assets::prelude::*;
use crate::video::MAX_FRAMEBUFFER_ATTACHMENTS;

use super::raster::Fragment;
use super::storage::{ImageStorage, Sampler, Texel};

/// How far refraction bends the lookup into the background, in screen units.
pub const REFRACTION_OFFSET: f32 = 0.05;
/// Absorption coefficient of refracting volumes, per unit of window depth.
pub const ABSORPTION: f32 = 8.0;

pub type Outputs = [Texel; MAX_FRAMEBUFFER_ATTACHMENTS];

/// The resolved uniforms of a draw.
pub struct Uniforms<'a> {
    pub mvp: Matrix4<f32>,
    pub nrp: Matrix3<f32>,
    pub alpha: f32,
    pub layer: i32,
    /// Dimensions of the bound target.
    pub viewport: Vector2<u32>,

    pub fb: Option<Sampler<'a>>,
    pub depth: Option<Sampler<'a>>,
    pub accum: Option<Sampler<'a>>,
    pub count: Option<Sampler<'a>>,
    pub transp: Option<Sampler<'a>>,

    pub head: Option<&'a ImageStorage>,
    pub list: Option<&'a ImageStorage>,
    pub alpha_tex: Option<&'a ImageStorage>,
    pub depth_tex: Option<&'a ImageStorage>,
    pub lock_tex: Option<&'a ImageStorage>,
    pub counter: Option<&'a AtomicU32>,
}

impl<'a> Uniforms<'a> {
    pub fn new(viewport: Vector2<u32>) -> Self {
        Uniforms {
            mvp: Matrix4::identity(),
            nrp: Matrix3::identity(),
            alpha: 1.0,
            layer: -1,
            viewport,
            fb: None,
            depth: None,
            accum: None,
            count: None,
            transp: None,
            head: None,
            list: None,
            alpha_tex: None,
            depth_tex: None,
            lock_tex: None,
            counter: None,
        }
    }

    /// Binds a sampler by name, ignoring names no program reads.
    pub fn bind_sampler(&mut self, name: HashValue<str>, sampler: Sampler<'a>) {
        if name == "fb" {
            self.fb = Some(sampler);
        } else if name == "depth" {
            self.depth = Some(sampler);
        } else if name == "accum" {
            self.accum = Some(sampler);
        } else if name == "count" {
            self.count = Some(sampler);
        } else if name == "transp" {
            self.transp = Some(sampler);
        }
    }

    pub fn bind_image(&mut self, name: HashValue<str>, image: &'a ImageStorage) {
        if name == "head" {
            self.head = Some(image);
        } else if name == "list" {
            self.list = Some(image);
        } else if name == "alpha_tex" {
            self.alpha_tex = Some(image);
        } else if name == "depth_tex" {
            self.depth_tex = Some(image);
        } else if name == "lock_tex" {
            self.lock_tex = Some(image);
        }
    }

    pub fn bind_value(&mut self, name: HashValue<str>, v: UniformVariable) {
        match v {
            UniformVariable::Matrix4f(m) if name == "mat_mvp" => self.mvp = m.into(),
            UniformVariable::Matrix3f(m) if name == "mat_nrp" => self.nrp = m.into(),
            UniformVariable::F32(v) if name == "alpha" => self.alpha = v,
            UniformVariable::I32(v) if name == "layer" => self.layer = v,
            _ => {}
        }
    }
}

#[inline]
fn rgb(v: Texel) -> [f32; 3] {
    [v[0], v[1], v[2]]
}

#[inline]
fn single(v: Texel) -> Outputs {
    let mut out = [[0.0; 4]; MAX_FRAMEBUFFER_ATTACHMENTS];
    out[0] = v;
    out
}

/// Where the refracted ray hits the background, in normalized coordinates.
fn refracted_uv(u: &Uniforms, frag: &Fragment) -> Vector2<f32> {
    let n = if frag.normal.magnitude2() > 0.0 {
        frag.normal.normalize()
    } else {
        frag.normal
    };

    Vector2::new(
        (frag.x as f32 + 0.5) / u.viewport.x as f32 + n.x * REFRACTION_OFFSET,
        (frag.y as f32 + 0.5) / u.viewport.y as f32 + n.y * REFRACTION_OFFSET,
    )
}

fn refract_back(u: &Uniforms, frag: &Fragment) -> Option<Outputs> {
    let bg = u.fb.as_ref()?.sample(refracted_uv(u, frag));
    let c = frag.color;
    Some(single([
        bg[0] * (0.5 + 0.5 * c.x),
        bg[1] * (0.5 + 0.5 * c.y),
        bg[2] * (0.5 + 0.5 * c.z),
        1.0,
    ]))
}

fn refract_front(u: &Uniforms, frag: &Fragment) -> Option<Outputs> {
    let (x, y) = (i64::from(frag.x), i64::from(frag.y));
    let back = u.depth.as_ref()?.fetch(x, y)[0];
    let thickness = (back - frag.depth).max(0.0);

    let bg = u.fb.as_ref()?.sample(refracted_uv(u, frag));
    let c = frag.color;
    let absorb = |v: f32| (-(1.0 - v) * thickness * ABSORPTION).exp();
    Some(single([
        bg[0] * absorb(c.x),
        bg[1] * absorb(c.y),
        bg[2] * absorb(c.z),
        1.0,
    ]))
}

/// Discards fragments at or behind the layer peeled by the previous pass.
fn peeled(u: &Uniforms, frag: &Fragment) -> Option<()> {
    let prev = u.depth.as_ref()?.fetch(i64::from(frag.x), i64::from(frag.y))[0];
    if frag.depth >= prev {
        None
    } else {
        Some(())
    }
}

fn abuffer_build(u: &Uniforms, frag: &Fragment) -> Option<Outputs> {
    let (head, list, counter) = (u.head?, u.list?, u.counter?);

    let index = counter.fetch_add(1, Ordering::Relaxed);
    if index as usize >= list.params.texels() {
        return None;
    }

    let next = head.exchange(frag.x, frag.y, index)?;
    let c = frag.color;
    let node = Node {
        color: [c.x, c.y, c.z],
        alpha: u.alpha,
        depth: frag.depth,
        next,
    };

    let (sx, sy) = abuffer::slot(index, list.params.dimensions.x);
    list.store(sx, sy, node.pack());
    Some(single([0.0; 4]))
}

fn abuffer_nodes(u: &Uniforms, frag: &Fragment) -> Option<abuffer::NodeList> {
    let (head, list) = (u.head?, u.list?);
    let width = list.params.dimensions.x;
    let capacity = list.params.texels() as u32;

    let first = head.load(frag.x, frag.y)[0];
    let mut nodes = abuffer::collect(first, |i| {
        if i < capacity {
            let (sx, sy) = abuffer::slot(i, width);
            Some(list.load(sx, sy))
        } else {
            None
        }
    });

    if nodes.is_empty() {
        return None;
    }

    abuffer::sort_back_to_front(&mut nodes);
    Some(nodes)
}

fn adaptive_visibility(u: &Uniforms, frag: &Fragment) -> Option<Outputs> {
    let (alphas, depths, lock) = (u.alpha_tex?, u.depth_tex?, u.lock_tex?);
    let (x, y) = (frag.x, frag.y);

    for _ in 0..visibility::MAX_LOCK_RETRIES {
        if lock.compare_exchange(x, y, 0, 1)? != 0 {
            ::std::hint::spin_loop();
            continue;
        }

        let d = depths.load_f32(x, y);
        let v = alphas.load_f32(x, y);
        let mut curve = VisibilityCurve::new(d, v);
        curve.insert(frag.depth, u.alpha);

        depths.store_f32(x, y, curve.depths);
        alphas.store_f32(x, y, curve.visibilities);
        lock.release(x, y, 0);
        break;
    }

    let c = frag.color;
    Some(single([c.x, c.y, c.z, u.alpha]))
}

fn adaptive_composite(u: &Uniforms, frag: &Fragment) -> Option<Outputs> {
    let (alphas, depths) = (u.alpha_tex?, u.depth_tex?);
    let curve = VisibilityCurve::new(depths.load_f32(frag.x, frag.y), alphas.load_f32(frag.x, frag.y));
    let vis = curve.eval(frag.depth);

    let c = frag.color;
    Some(single([c.x, c.y, c.z, u.alpha * vis]))
}

/// Runs `program` for one fragment. Returns `None` if the fragment is discarded.
pub fn shade(program: Program, u: &Uniforms, frag: &Fragment) -> Option<Outputs> {
    let (x, y) = (i64::from(frag.x), i64::from(frag.y));
    let c = frag.color;
    let a = u.alpha;

    match program {
        Program::Background => {
            let uv = Vector2::new(frag.position.x * 0.5 + 0.5, frag.position.y * 0.5 + 0.5);
            Some(single(u.fb.as_ref()?.sample(uv)))
        }

        Program::Simple => Some(single([c.x * a, c.y * a, c.z * a, a])),

        Program::DepthPeel => {
            peeled(u, frag)?;
            let dst = rgb(u.fb.as_ref()?.fetch(x, y));
            let v = oit::mix(dst, [c.x, c.y, c.z], a);
            Some(single([v[0], v[1], v[2], 1.0]))
        }

        Program::RefractBackFace => refract_back(u, frag),
        Program::RefractFrontFace => refract_front(u, frag),
        Program::RefractBackFacePeel => {
            peeled(u, frag)?;
            refract_back(u, frag)
        }
        Program::RefractFrontFacePeel => {
            peeled(u, frag)?;
            refract_front(u, frag)
        }

        Program::Meshkin => {
            let bg = rgb(u.fb.as_ref()?.fetch(x, y));
            Some(single(weighted::meshkin([c.x, c.y, c.z], bg, a)))
        }

        Program::BavoilMyersAccum => {
            let mut out = single([c.x * a, c.y * a, c.z * a, a]);
            out[1] = [a, 1.0, 0.0, 0.0];
            Some(out)
        }

        Program::BavoilMyersResolve => {
            let accum = u.accum.as_ref()?.fetch(x, y);
            let count = u.count.as_ref()?.fetch(x, y);
            let (avg, t) = weighted::bavoil_myers(rgb(accum), count[0], count[1])?;
            Some(single([avg[0], avg[1], avg[2], t]))
        }

        Program::BavoilMcGuireAccum | Program::BavoilMcGuireWeightedAccum => {
            let w = if program == Program::BavoilMcGuireWeightedAccum {
                weighted::depth_weight(frag.depth)
            } else {
                1.0
            };

            let mut out = single([c.x * a * w, c.y * a * w, c.z * a * w, a * w]);
            out[1] = [1.0 - a, 0.0, 0.0, 1.0];
            Some(out)
        }

        Program::BavoilMcGuireResolve => {
            let accum = u.accum.as_ref()?.fetch(x, y);
            let transp = u.transp.as_ref()?.fetch(x, y);
            let (avg, t) = weighted::bavoil_mcguire(accum, transp[0]);
            Some(single([avg[0], avg[1], avg[2], t]))
        }

        Program::ABufferBuild => abuffer_build(u, frag),

        Program::ABufferResolve => {
            let nodes = abuffer_nodes(u, frag)?;
            Some(single(abuffer::composite(&nodes)))
        }

        Program::ABufferResolveLayer => {
            let nodes = abuffer_nodes(u, frag)?;
            if u.layer < 0 {
                return None;
            }

            nodes.get(u.layer as usize).map(|v| single(v.premultiplied()))
        }

        Program::AdaptiveVisibility => adaptive_visibility(u, frag),
        Program::AdaptiveComposite => adaptive_composite(u, frag),
    }
}

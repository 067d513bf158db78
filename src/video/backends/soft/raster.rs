//! Primitive assembly and triangle rasterization.
//!
//! Window coordinates have their origin at the bottom-left corner, pixel
//! centers sit at half-integers and shared edges follow the top-left rule, so
//! two triangles of a quad never cover a pixel twice.

use crate::math::prelude::*;
use crate::video::assets::prelude::*;

const MIN_W: f32 = 1e-6;

/// An interpolated fragment, ready to be shaded.
#[derive(Debug, Clone, Copy)]
pub struct Fragment {
    pub x: u32,
    pub y: u32,
    /// Window-space depth in [0, 1].
    pub depth: f32,
    pub front_facing: bool,
    pub position: Vector3<f32>,
    pub normal: Vector3<f32>,
    pub color: Vector3<f32>,
}

#[derive(Debug, Clone, Copy)]
struct ClipVertex {
    clip: Vector4<f32>,
    position: Vector3<f32>,
    normal: Vector3<f32>,
    color: Vector3<f32>,
}

/// Transforms one vertex by the vertex stage of a program.
fn transform(
    stage: VertexStage,
    mvp: &Matrix4<f32>,
    nrp: &Matrix3<f32>,
    v: &Vertex,
) -> ClipVertex {
    let position = Vector3::from(v.position);
    let clip = match stage {
        VertexStage::Scene => mvp * position.extend(1.0),
        VertexStage::Screen => Vector4::new(position.x, position.y, 0.0, 1.0),
    };

    ClipVertex {
        clip,
        position,
        normal: nrp * Vector3::from(v.normal),
        color: Vector3::from(v.color),
    }
}

/// Returns the vertex indices of every assembled triangle. Odd triangles of a
/// strip swap their first two vertices to keep a consistent winding.
pub fn assemble(primitive: MeshPrimitive, len: usize) -> Vec<[usize; 3]> {
    match primitive {
        MeshPrimitive::Triangles => (0..len / 3).map(|i| [i * 3, i * 3 + 1, i * 3 + 2]).collect(),
        MeshPrimitive::TriangleStrip => (0..len.saturating_sub(2))
            .map(|i| {
                if i % 2 == 0 {
                    [i, i + 1, i + 2]
                } else {
                    [i + 1, i, i + 2]
                }
            })
            .collect(),
    }
}

#[inline]
fn edge(a: Vector2<f32>, b: Vector2<f32>, p: Vector2<f32>) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

#[inline]
fn is_top_left(a: Vector2<f32>, b: Vector2<f32>) -> bool {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    (dy == 0.0 && dx < 0.0) || dy < 0.0
}

#[inline]
fn covers(w: f32, a: Vector2<f32>, b: Vector2<f32>) -> bool {
    w > 0.0 || (w == 0.0 && is_top_left(a, b))
}

/// Rasterizes `vertices` into fragments, in primitive order. Returns the
/// fragments along with the number of assembled triangles.
pub fn rasterize(
    primitive: MeshPrimitive,
    vertices: &[Vertex],
    stage: VertexStage,
    mvp: &Matrix4<f32>,
    nrp: &Matrix3<f32>,
    state: &RenderState,
    viewport: Vector2<u32>,
) -> (Vec<Fragment>, u32) {
    let transformed: Vec<_> = vertices
        .iter()
        .map(|v| transform(stage, mvp, nrp, v))
        .collect();

    let triangles = assemble(primitive, vertices.len());
    let mut fragments = Vec::new();

    for tri in &triangles {
        let mut v = [transformed[tri[0]], transformed[tri[1]], transformed[tri[2]]];
        if v.iter().any(|v| v.clip.w <= MIN_W) {
            continue;
        }

        let mut s = [Vector2::new(0.0, 0.0); 3];
        let mut z = [0.0; 3];
        for i in 0..3 {
            let ndc = v[i].clip.truncate() / v[i].clip.w;
            s[i] = Vector2::new(
                (ndc.x * 0.5 + 0.5) * viewport.x as f32,
                (ndc.y * 0.5 + 0.5) * viewport.y as f32,
            );
            z[i] = ndc.z;
        }

        let mut area = edge(s[0], s[1], s[2]);
        if area == 0.0 {
            continue;
        }

        let ccw = area > 0.0;
        let front_facing = match state.front_face_order {
            FrontFaceOrder::CounterClockwise => ccw,
            FrontFaceOrder::Clockwise => !ccw,
        };

        let culled = match state.cull_face {
            CullFace::Nothing => false,
            CullFace::Front => front_facing,
            CullFace::Back => !front_facing,
        };

        if culled {
            continue;
        }

        if !ccw {
            v.swap(1, 2);
            s.swap(1, 2);
            z.swap(1, 2);
            area = -area;
        }

        let min_x = s.iter().map(|v| v.x).fold(::std::f32::INFINITY, f32::min);
        let max_x = s.iter().map(|v| v.x).fold(::std::f32::NEG_INFINITY, f32::max);
        let min_y = s.iter().map(|v| v.y).fold(::std::f32::INFINITY, f32::min);
        let max_y = s.iter().map(|v| v.y).fold(::std::f32::NEG_INFINITY, f32::max);

        let x0 = min_x.floor().max(0.0) as u32;
        let y0 = min_y.floor().max(0.0) as u32;
        let x1 = (max_x.ceil().max(0.0) as u32).min(viewport.x);
        let y1 = (max_y.ceil().max(0.0) as u32).min(viewport.y);

        for py in y0..y1 {
            for px in x0..x1 {
                let p = Vector2::new(px as f32 + 0.5, py as f32 + 0.5);
                let w0 = edge(s[1], s[2], p);
                let w1 = edge(s[2], s[0], p);
                let w2 = edge(s[0], s[1], p);

                if !covers(w0, s[1], s[2]) || !covers(w1, s[2], s[0]) || !covers(w2, s[0], s[1]) {
                    continue;
                }

                let l = [w0 / area, w1 / area, w2 / area];
                let ndc_z = l[0] * z[0] + l[1] * z[1] + l[2] * z[2];
                if ndc_z < -1.0 || ndc_z > 1.0 {
                    continue;
                }

                let p = [l[0] / v[0].clip.w, l[1] / v[1].clip.w, l[2] / v[2].clip.w];
                let sum = p[0] + p[1] + p[2];
                let p = [p[0] / sum, p[1] / sum, p[2] / sum];
                let lerp = |a: Vector3<f32>, b: Vector3<f32>, c: Vector3<f32>| a * p[0] + b * p[1] + c * p[2];

                fragments.push(Fragment {
                    x: px,
                    y: py,
                    depth: ndc_z * 0.5 + 0.5,
                    front_facing,
                    position: lerp(v[0].position, v[1].position, v[2].position),
                    normal: lerp(v[0].normal, v[1].normal, v[2].normal),
                    color: lerp(v[0].color, v[1].color, v[2].color),
                });
            }
        }
    }

    (fragments, triangles.len() as u32)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::video::assets::mesh::screen_quad;

    fn identity() -> (Matrix4<f32>, Matrix3<f32>) {
        (Matrix4::identity(), Matrix3::identity())
    }

    #[test]
    fn full_screen() {
        let (mvp, nrp) = identity();
        let quad = screen_quad();
        let (fragments, triangles) = rasterize(
            MeshPrimitive::TriangleStrip,
            &quad,
            VertexStage::Screen,
            &mvp,
            &nrp,
            &RenderState::default(),
            Vector2::new(7, 5),
        );

        assert_eq!(triangles, 2);
        assert_eq!(fragments.len(), 35);

        let mut seen = vec![false; 35];
        for v in &fragments {
            let index = (v.y * 7 + v.x) as usize;
            assert!(!seen[index]);
            seen[index] = true;
        }
    }

    #[test]
    fn culling() {
        let (mvp, nrp) = identity();
        let ccw = [
            Vertex::new([-1.0, -1.0, 0.0], [0.0; 3], [1.0; 3]),
            Vertex::new([1.0, -1.0, 0.0], [0.0; 3], [1.0; 3]),
            Vertex::new([-1.0, 1.0, 0.0], [0.0; 3], [1.0; 3]),
        ];

        let draw = |state: RenderState| {
            rasterize(
                MeshPrimitive::Triangles,
                &ccw,
                VertexStage::Scene,
                &mvp,
                &nrp,
                &state,
                Vector2::new(4, 4),
            )
            .0
        };

        let front = draw(RenderState::default());
        assert!(!front.is_empty());
        assert!(front.iter().all(|v| v.front_facing));
        assert!(draw(RenderState::default().with_cull_face(CullFace::Front)).is_empty());
        assert_eq!(draw(RenderState::default().with_cull_face(CullFace::Back)).len(), front.len());
    }

    #[test]
    fn depth_clipping() {
        let (nrp, mvp) = (Matrix3::identity(), Matrix4::from_translation(Vector3::new(0.0, 0.0, 2.0)));
        let quad: Vec<_> = screen_quad();
        let (fragments, _) = rasterize(
            MeshPrimitive::TriangleStrip,
            &quad,
            VertexStage::Scene,
            &mvp,
            &nrp,
            &RenderState::default(),
            Vector2::new(4, 4),
        );

        assert!(fragments.is_empty());
    }
}

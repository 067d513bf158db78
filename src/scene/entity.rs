//! Loads the entity scene from a Wavefront OBJ file, one section per group.

use std::io;
use std::path::Path;

use obj;

use crate::errors::*;
use crate::math::prelude::*;
use crate::video::prelude::*;

use super::Section;

pub type ObjData = obj::Obj<'static, obj::SimplePolygon>;

/// How the entity scene is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityParams {
    /// Colors vertices with a gradient along z instead of the diffuse color of
    /// their material.
    pub gradient: bool,
    /// Shows the entity twice side by side. The right copy submits its
    /// triangles in reverse order.
    pub two_objects: bool,
}

impl Default for EntityParams {
    fn default() -> Self {
        EntityParams {
            gradient: true,
            two_objects: true,
        }
    }
}

/// The triangles of an OBJ group.
#[derive(Debug, Clone)]
pub struct Group {
    pub name: String,
    pub vertices: Vec<Vertex>,
}

/// Reads an OBJ file, and its material libraries if `materials` is set.
pub fn load<P: AsRef<Path>>(path: P, materials: bool) -> Result<ObjData> {
    let path = path.as_ref();
    // Same steps as `obj::Obj::load`, whose signature ties the result to the
    // lifetime of `path`.
    let mut data: ObjData = std::fs::File::open(path)
        .and_then(|f| obj::Obj::load_buf(&mut io::BufReader::new(f)))
        .map_err(|err| format_err!("Failed to load entity {}: {}", path.display(), err))?;
    data.path = path.parent().unwrap().to_owned();

    if materials {
        data.load_mtls().map_err(|errs| {
            format_err!(
                "Failed to load {} material libraries of {}.",
                errs.len(),
                path.display()
            )
        })?;
    }

    info!(
        "Loads entity {} with {} positions.",
        path.display(),
        data.position.len()
    );

    Ok(data)
}

/// Parses OBJ data from memory. Materials are not resolved.
pub fn parse(bytes: &[u8]) -> Result<ObjData> {
    let data = obj::Obj::load_buf(&mut io::BufReader::new(bytes))?;
    Ok(data)
}

/// Returns the extent of the entity along z.
fn depth_range(data: &ObjData) -> (f32, f32) {
    data.position
        .iter()
        .fold((::std::f32::MAX, ::std::f32::MIN), |(lo, hi), v| {
            (lo.min(v[2]), hi.max(v[2]))
        })
}

/// Triangulates every group of `data` into colored vertices.
pub fn triangulate(data: &ObjData, gradient: bool) -> Result<Vec<Group>> {
    let (zmin, zmax) = depth_range(data);
    let extent = zmax - zmin;

    let position = |i: usize| -> Result<Vector3<f32>> {
        data.position
            .get(i)
            .map(|&v| v.into())
            .ok_or_else(|| format_err!("Position {} is out of bounds.", i))
    };

    let mut groups = Vec::new();
    for object in &data.objects {
        for group in &object.groups {
            let diffuse = group
                .material
                .as_ref()
                .and_then(|v| v.kd)
                .unwrap_or([1.0, 1.0, 1.0]);

            let color = |p: Vector3<f32>| {
                if gradient {
                    let green = if extent > 0.0 {
                        (p.z - zmin) / extent
                    } else {
                        0.0
                    };

                    [1.0, green, 0.0]
                } else {
                    diffuse
                }
            };

            let mut vertices = Vec::new();
            for poly in &group.polys {
                if poly.len() < 3 {
                    continue;
                }

                for i in 1..poly.len() - 1 {
                    let corners = [poly[0], poly[i], poly[i + 1]];
                    let p = [
                        position(corners[0].0)?,
                        position(corners[1].0)?,
                        position(corners[2].0)?,
                    ];

                    let face = (p[1] - p[0]).cross(p[2] - p[0]);
                    let face = if face.magnitude2() > 0.0 {
                        face.normalize()
                    } else {
                        face
                    };

                    for (corner, &p) in corners.iter().zip(p.iter()) {
                        let n = corner
                            .2
                            .and_then(|i| data.normal.get(i))
                            .map(|&v| v.into())
                            .unwrap_or(face);

                        vertices.push(Vertex::new(p.into(), n.into(), color(p)));
                    }
                }
            }

            if !vertices.is_empty() {
                groups.push(Group {
                    name: group.name.clone(),
                    vertices,
                });
            }
        }
    }

    if groups.is_empty() {
        bail!("Entity has no triangles.");
    }

    Ok(groups)
}

/// Reverses the submission order of the triangles of a triangle list.
pub fn reverse_triangles(vertices: &[Vertex]) -> Vec<Vertex> {
    vertices
        .chunks(3)
        .rev()
        .flat_map(|v| v.iter().cloned())
        .collect()
}

/// Uploads the groups of the entity as scene sections.
pub fn sections(
    video: &mut VideoSystem,
    groups: &[Group],
    params: EntityParams,
) -> Result<Vec<Section>> {
    let left = if params.two_objects {
        Matrix4::from_translation(Vector3::new(-2.0, 0.0, 0.0))
    } else {
        Matrix4::identity()
    };

    let mut sections = Vec::new();
    for group in groups {
        let mesh = video.create_mesh(MeshPrimitive::Triangles, &group.vertices)?;
        sections.push(Section::new(mesh, left));
    }

    if params.two_objects {
        let right = Matrix4::from_translation(Vector3::new(2.0, 0.0, 0.0));
        for group in groups {
            let vertices = reverse_triangles(&group.vertices);
            let mesh = video.create_mesh(MeshPrimitive::Triangles, &vertices)?;
            sections.push(Section::new(mesh, right));
        }
    }

    debug!("Creates {} entity sections.", sections.len());
    Ok(sections)
}

#[cfg(test)]
mod test {
    use super::*;

    const TETRAHEDRON: &str = "
o tetrahedron
v 0 0 0
v 1 0 0
v 0 1 0
v 0 0 1
g bottom
f 1 3 2
g sides
f 1 2 4
f 2 3 4 1
";

    #[test]
    fn triangles() {
        let data = parse(TETRAHEDRON.as_bytes()).unwrap();
        let groups = triangulate(&data, true).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].vertices.len(), 3);
        assert_eq!(groups[1].vertices.len(), 9);

        let bottom = &groups[0].vertices[0];
        assert_eq!(bottom.normal, [0.0, 0.0, -1.0]);

        let top = groups[1]
            .vertices
            .iter()
            .find(|v| v.position == [0.0, 0.0, 1.0])
            .unwrap();

        assert_eq!(top.color, [1.0, 1.0, 0.0]);
        assert_eq!(bottom.color, [1.0, 0.0, 0.0]);

        let flat = triangulate(&data, false).unwrap();
        assert!(flat[1].vertices.iter().all(|v| v.color == [1.0, 1.0, 1.0]));
    }

    #[test]
    fn reverse() {
        let data = parse(TETRAHEDRON.as_bytes()).unwrap();
        let groups = triangulate(&data, true).unwrap();
        let vertices = &groups[1].vertices;
        let reversed = reverse_triangles(vertices);

        assert_eq!(reversed.len(), vertices.len());
        assert_eq!(&reversed[0..3], &vertices[6..9]);
        assert_eq!(&reversed[6..9], &vertices[0..3]);
    }
}

/// VRML 2.0 reader covering the subset written by CAD and scanning tools:
/// `Shape`s holding an `IndexedFaceSet` plus an optional `diffuseColor`.
use nalgebra::Point3;
use nom::{
    bytes::complete::take_while,
    character::complete::{char, i64 as int},
    multi::many0,
    number::complete::float,
    sequence::{delimited, pair, terminated},
    IResult,
};
use thiserror::Error;

use crate::geometry::{Mesh, Triangle};
use crate::material::Material;
use crate::node::{Part, SceneNode};

/// VRML default for `Material.diffuseColor`
const DEFAULT_DIFFUSE: [f32; 3] = [0.8, 0.8, 0.8];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum VrmlError {
    #[error("VRML file is not valid UTF-8")]
    NotText,
    #[error("missing `#VRML` header")]
    MissingHeader,
    #[error("unbalanced braces after `{0}`")]
    Unbalanced(&'static str),
    #[error("malformed `{0}` field")]
    Syntax(&'static str),
    #[error("coordIndex {index} out of range for {points} points")]
    IndexOutOfRange { index: i64, points: usize },
    #[error("no IndexedFaceSet geometry found")]
    NoGeometry,
}

pub fn parse_vrml(data: &[u8]) -> Result<SceneNode, VrmlError> {
    let text = std::str::from_utf8(data).map_err(|_| VrmlError::NotText)?;
    if !text.trim_start().starts_with("#VRML") {
        return Err(VrmlError::MissingHeader);
    }
    let source = strip_comments(text);

    let mut parts = Vec::new();
    let mut cursor = 0;
    while let Some(offset) = find_keyword(&source[cursor..], "IndexedFaceSet") {
        let start = cursor + offset;
        let (body, end) =
            block_body(&source[start..]).ok_or(VrmlError::Unbalanced("IndexedFaceSet"))?;

        let shape_start = rfind_keyword(&source[..start], "Shape").unwrap_or(0);
        let material = match find_keyword(&source[shape_start..start], "diffuseColor") {
            Some(at) => {
                let rest = &source[shape_start + at + "diffuseColor".len()..];
                let (_, rgb) = color(rest).map_err(|_| VrmlError::Syntax("diffuseColor"))?;
                rgb
            }
            None => DEFAULT_DIFFUSE,
        };

        parts.push(Part {
            mesh: face_set(body)?,
            material: Material::with_color(Material::pack_rgb(material)),
        });
        cursor = start + end;
    }

    if parts.is_empty() {
        return Err(VrmlError::NoGeometry);
    }
    log::debug!("parsed {} VRML shapes", parts.len());
    Ok(SceneNode { name: None, parts })
}

fn strip_comments(text: &str) -> String {
    text.lines()
        .map(|line| line.split_once('#').map_or(line, |(code, _)| code))
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_ident(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_keyword_at(haystack: &str, at: usize, keyword: &str) -> bool {
    let before = haystack[..at].chars().next_back();
    let after = haystack[at + keyword.len()..].chars().next();
    !before.map_or(false, is_ident) && !after.map_or(false, is_ident)
}

fn find_keyword(haystack: &str, keyword: &str) -> Option<usize> {
    haystack
        .match_indices(keyword)
        .map(|(at, _)| at)
        .find(|&at| is_keyword_at(haystack, at, keyword))
}

fn rfind_keyword(haystack: &str, keyword: &str) -> Option<usize> {
    haystack
        .rmatch_indices(keyword)
        .map(|(at, _)| at)
        .find(|&at| is_keyword_at(haystack, at, keyword))
}

/// Contents between the first `{` and its matching `}`, plus the offset just
/// past the closing brace.
fn block_body(text: &str) -> Option<(&str, usize)> {
    let open = text.find('{')?;
    let mut depth = 0usize;
    for (at, c) in text[open..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let close = open + at;
                    return Some((&text[open + 1..close], close + 1));
                }
            }
            _ => {}
        }
    }
    None
}

fn separator(input: &str) -> IResult<&str, &str> {
    take_while(|c: char| c.is_whitespace() || c == ',')(input)
}

fn float_list(input: &str) -> IResult<&str, Vec<f32>> {
    delimited(
        pair(char('['), separator),
        many0(terminated(float, separator)),
        char(']'),
    )(input)
}

fn index_list(input: &str) -> IResult<&str, Vec<i64>> {
    delimited(
        pair(char('['), separator),
        many0(terminated(int, separator)),
        char(']'),
    )(input)
}

fn color(input: &str) -> IResult<&str, [f32; 3]> {
    let (input, _) = separator(input)?;
    let (input, r) = terminated(float, separator)(input)?;
    let (input, g) = terminated(float, separator)(input)?;
    let (input, b) = float(input)?;
    Ok((input, [r, g, b]))
}

fn field_list<'a, T>(
    body: &'a str,
    name: &'static str,
    list: fn(&'a str) -> IResult<&'a str, Vec<T>>,
) -> Result<Vec<T>, VrmlError> {
    let at = find_keyword(body, name).ok_or(VrmlError::Syntax(name))?;
    let rest = body[at + name.len()..].trim_start();
    list(rest)
        .map(|(_, values)| values)
        .map_err(|_| VrmlError::Syntax(name))
}

fn face_set(body: &str) -> Result<Mesh, VrmlError> {
    let coords = field_list(body, "point", float_list)?;
    let points: Vec<Point3<f32>> = coords
        .chunks_exact(3)
        .map(|c| Point3::new(c[0], c[1], c[2]))
        .collect();
    let indices = field_list(body, "coordIndex", index_list)?;

    let lookup = |index: i64| {
        usize::try_from(index)
            .ok()
            .and_then(|i| points.get(i).copied())
            .ok_or(VrmlError::IndexOutOfRange {
                index,
                points: points.len(),
            })
    };

    let mut mesh = Mesh::new();
    for polygon in indices.split(|&i| i == -1) {
        if polygon.len() < 3 {
            continue;
        }
        let anchor = lookup(polygon[0])?;
        for pair in polygon[1..].windows(2) {
            mesh.add_triangle(Triangle::from_positions(
                anchor,
                lookup(pair[0])?,
                lookup(pair[1])?,
            ));
        }
    }
    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_SHAPES: &str = "#VRML V2.0 utf8
# exported by a scanner
Transform {
  children [
    Shape {
      appearance Appearance { material Material { diffuseColor 1 0 0 } }
      geometry IndexedFaceSet {
        coord Coordinate { point [ 0 0 0, 1 0 0, 1 1 0, 0 1 0 ] }
        coordIndex [ 0, 1, 2, 3, -1 ]
      }
    }
    Shape {
      geometry IndexedFaceSet {
        coordIndex [ 0 1 2 -1 ]
        coord Coordinate { point [ 0 0 5 2 0 5 0 2 5 ] }
      }
    }
  ]
}
";

    #[test]
    fn test_parse_shapes() {
        let node = parse_vrml(TWO_SHAPES.as_bytes()).unwrap();
        assert_eq!(node.parts.len(), 2);
        // The quad is fan-triangulated
        assert_eq!(node.parts[0].mesh.triangles.len(), 2);
        assert_eq!(node.parts[0].material.color, 0xff0000);
        assert_eq!(node.parts[1].mesh.triangles.len(), 1);
        assert_eq!(node.parts[1].material.color, 0xcccccc);
        assert_eq!(node.triangle_count(), 3);
    }

    #[test]
    fn test_missing_header() {
        assert_eq!(
            parse_vrml(b"Shape { }"),
            Err(VrmlError::MissingHeader)
        );
    }

    #[test]
    fn test_no_geometry() {
        assert_eq!(
            parse_vrml(b"#VRML V2.0 utf8\nShape { }\n"),
            Err(VrmlError::NoGeometry)
        );
    }

    #[test]
    fn test_index_out_of_range() {
        let text = "#VRML V2.0 utf8
Shape { geometry IndexedFaceSet { coord Coordinate { point [ 0 0 0, 1 0 0, 0 1 0 ] } coordIndex [ 0 1 7 -1 ] } }";
        assert_eq!(
            parse_vrml(text.as_bytes()),
            Err(VrmlError::IndexOutOfRange {
                index: 7,
                points: 3
            })
        );
    }

    #[test]
    fn test_unbalanced_block() {
        let text = "#VRML V2.0 utf8\nShape { geometry IndexedFaceSet { coordIndex [ 0 1 2 ]";
        assert_eq!(
            parse_vrml(text.as_bytes()),
            Err(VrmlError::Unbalanced("IndexedFaceSet"))
        );
    }
}

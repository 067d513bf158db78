//! Per-pixel linked lists of fragments.
//!
//! Every node is four unsigned integers `(packed color, depth bits, next, 0)`
//! stored in a two-dimensional list image; node `i` lives at texel
//! `(i % width, i / width)`. The head image holds the most recently pushed node
//! of every pixel, or `HEAD_SENTINEL` for pixels without fragments.

use smallvec::SmallVec;

/// Marks the end of a list.
pub const HEAD_SENTINEL: u32 = 0xFFFF_FFFF;
/// Maximum number of nodes the resolve visits per pixel.
pub const MAX_WALK: usize = 32;

pub type NodeList = SmallVec<[Node; MAX_WALK]>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    pub color: [f32; 3],
    pub alpha: f32,
    pub depth: f32,
    pub next: u32,
}

impl Node {
    #[inline]
    pub fn pack(&self) -> [u32; 4] {
        let c = self.color;
        [
            pack_unorm4x8([c[0], c[1], c[2], self.alpha]),
            self.depth.to_bits(),
            self.next,
            0,
        ]
    }

    #[inline]
    pub fn unpack(raw: [u32; 4]) -> Self {
        let c = unpack_unorm4x8(raw[0]);
        Node {
            color: [c[0], c[1], c[2]],
            alpha: c[3],
            depth: f32::from_bits(raw[1]),
            next: raw[2],
        }
    }

    /// Returns the premultiplied color of this node.
    #[inline]
    pub fn premultiplied(&self) -> [f32; 4] {
        let a = self.alpha;
        [self.color[0] * a, self.color[1] * a, self.color[2] * a, a]
    }
}

/// Packs four normalized values into one integer, the first in the lowest byte.
pub fn pack_unorm4x8(v: [f32; 4]) -> u32 {
    v.iter().enumerate().fold(0, |acc, (i, &c)| {
        let byte = (c.max(0.0).min(1.0) * 255.0).round() as u32;
        acc | (byte << (i * 8))
    })
}

pub fn unpack_unorm4x8(v: u32) -> [f32; 4] {
    let mut out = [0.0; 4];
    for (i, c) in out.iter_mut().enumerate() {
        *c = ((v >> (i * 8)) & 0xFF) as f32 / 255.0;
    }
    out
}

/// Returns the texel of node `index` in a list image `width` texels wide.
#[inline]
pub fn slot(index: u32, width: u32) -> (u32, u32) {
    (index % width, index / width)
}

/// Walks a list from `head`, visiting at most `MAX_WALK` nodes. `fetch` returns
/// the raw node of an index, or `None` if it is out of the list image.
pub fn collect<F>(head: u32, fetch: F) -> NodeList
where
    F: Fn(u32) -> Option<[u32; 4]>,
{
    let mut nodes = NodeList::new();
    let mut cursor = head;

    while cursor != HEAD_SENTINEL && nodes.len() < MAX_WALK {
        match fetch(cursor) {
            Some(raw) => {
                let node = Node::unpack(raw);
                cursor = node.next;
                nodes.push(node);
            }
            None => break,
        }
    }

    nodes
}

/// Sorts nodes by descending depth. Nodes of equal depth keep their order.
pub fn sort_back_to_front(nodes: &mut [Node]) {
    nodes.sort_by(|lhs, rhs| {
        rhs.depth
            .partial_cmp(&lhs.depth)
            .unwrap_or(::std::cmp::Ordering::Equal)
    });
}

/// Composites back-to-front sorted nodes with premultiplied over.
pub fn composite(nodes: &[Node]) -> [f32; 4] {
    nodes
        .iter()
        .fold([0.0; 4], |acc, node| super::over(node.premultiplied(), acc))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn pack() {
        let node = Node {
            color: [1.0, 0.5, 0.0],
            alpha: 0.5,
            depth: 0.25,
            next: HEAD_SENTINEL,
        };

        let raw = node.pack();
        assert_eq!(raw[0] & 0xFF, 255);
        assert_eq!((raw[0] >> 8) & 0xFF, 128);
        assert_eq!(raw[0] >> 24, 128);

        let rhs = Node::unpack(raw);
        assert_eq!(rhs.depth, 0.25);
        assert_eq!(rhs.next, HEAD_SENTINEL);
        assert!((rhs.alpha - 0.5).abs() < 1.0 / 255.0);
    }

    #[test]
    fn walk() {
        let mut list = Vec::new();
        for i in 0..40u32 {
            let next = if i == 0 { HEAD_SENTINEL } else { i - 1 };
            let node = Node {
                color: [1.0, 1.0, 1.0],
                alpha: 0.5,
                depth: i as f32 / 40.0,
                next,
            };
            list.push(node.pack());
        }

        let fetch = |i: u32| list.get(i as usize).cloned();
        assert_eq!(collect(HEAD_SENTINEL, &fetch).len(), 0);
        assert_eq!(collect(2, &fetch).len(), 3);
        assert_eq!(collect(39, &fetch).len(), MAX_WALK);
        assert_eq!(collect(100, &fetch).len(), 0);
    }

    #[test]
    fn red_over_blue() {
        let red = Node {
            color: [1.0, 0.0, 0.0],
            alpha: 0.5,
            depth: 0.4,
            next: HEAD_SENTINEL,
        };

        let blue = Node {
            color: [0.0, 0.0, 1.0],
            alpha: 0.5,
            depth: 0.6,
            next: 0,
        };

        let mut nodes = [red, blue];
        sort_back_to_front(&mut nodes);
        assert_eq!(nodes[0], blue);

        let c = composite(&nodes);
        assert_eq!(c, [0.5, 0.0, 0.25, 0.75]);
        assert_eq!(slot(5, 4), (1, 1));
    }
}

use crate::error::FaceMaskError;

/// Glyphs used to mask faces, in assignment order.
const DEFAULT_GLYPHS: [char; 5] = ['😊', '😎', '😍', '🤔', '😄'];

/// Fixed rotation of glyphs assigned to faces by position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    glyphs: Vec<char>,
}

impl Palette {
    /// Build a palette from an ordered glyph list. The list must not be empty.
    pub fn new(glyphs: Vec<char>) -> Result<Self, FaceMaskError> {
        if glyphs.is_empty() {
            return Err(FaceMaskError::EmptyPalette);
        }
        Ok(Self { glyphs })
    }

    /// Glyph for the face at `index` in detector order, cycling through the palette.
    pub fn select(&self, index: usize) -> char {
        self.glyphs[index % self.glyphs.len()]
    }

    /// Number of distinct glyphs before the rotation repeats.
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    /// Always `false`; an empty palette cannot be constructed.
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// The glyphs in assignment order.
    pub fn glyphs(&self) -> &[char] {
        &self.glyphs
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            glyphs: DEFAULT_GLYPHS.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_palette_is_rejected() {
        assert!(matches!(
            Palette::new(vec![]),
            Err(FaceMaskError::EmptyPalette)
        ));
    }

    #[test]
    fn selection_cycles() {
        let palette = Palette::new(vec!['a', 'b']).unwrap();
        let picked: Vec<char> = (0..3).map(|i| palette.select(i)).collect();
        assert_eq!(picked, vec!['a', 'b', 'a']);
    }

    #[test]
    fn selection_repeats_every_palette_length() {
        let palette = Palette::default();
        for i in 0..20 {
            assert_eq!(palette.select(i), palette.select(i + palette.len()));
        }
    }

    #[test]
    fn default_palette_order() {
        let palette = Palette::default();
        assert_eq!(palette.len(), 5);
        assert_eq!(palette.select(0), '😊');
        assert_eq!(palette.select(4), '😄');
        assert_eq!(palette.select(5), '😊');
        assert!(!palette.is_empty());
    }

    #[test]
    fn single_glyph_palette() {
        let palette = Palette::new(vec!['x']).unwrap();
        assert!((0..10).all(|i| palette.select(i) == 'x'));
    }
}

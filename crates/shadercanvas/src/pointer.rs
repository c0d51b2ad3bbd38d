/// Last pointer position, normalized to the surface client size.
///
/// `(0, 0)` is the top-left corner and `(1, 1)` the bottom-right; positions
/// outside the surface are clamped onto its edge.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerState {
    position: [f32; 2],
}

impl PointerState {
    /// Records a move to `(x, y)` in client pixels of a `width`×`height`
    /// surface. Degenerate sizes keep the previous position.
    pub fn handle_moved(&mut self, x: f32, y: f32, width: f32, height: f32) {
        if !(width > 0.0 && height > 0.0) {
            tracing::trace!(width, height, "ignoring pointer move on empty surface");
            return;
        }
        self.position = [(x / width).clamp(0.0, 1.0), (y / height).clamp(0.0, 1.0)];
    }

    pub fn as_uniform(&self) -> [f32; 2] {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_origin() {
        assert_eq!(PointerState::default().as_uniform(), [0.0, 0.0]);
    }

    #[test]
    fn bottom_right_corner_is_one_one() {
        let mut pointer = PointerState::default();
        pointer.handle_moved(800.0, 600.0, 800.0, 600.0);
        assert_eq!(pointer.as_uniform(), [1.0, 1.0]);
    }

    #[test]
    fn positions_are_normalized_and_clamped() {
        let mut pointer = PointerState::default();
        pointer.handle_moved(200.0, 150.0, 800.0, 600.0);
        assert_eq!(pointer.as_uniform(), [0.25, 0.25]);

        pointer.handle_moved(-10.0, 900.0, 800.0, 600.0);
        assert_eq!(pointer.as_uniform(), [0.0, 1.0]);
    }

    #[test]
    fn empty_surface_keeps_previous_position() {
        let mut pointer = PointerState::default();
        pointer.handle_moved(400.0, 300.0, 800.0, 600.0);
        pointer.handle_moved(10.0, 10.0, 0.0, 600.0);
        assert_eq!(pointer.as_uniform(), [0.5, 0.5]);
    }
}

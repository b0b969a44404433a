/// Grab / hold state machine
///
/// Runs on the fixed tick. Each hand turns its analog values into a latched grip;
/// a grip edge may start or stop that hand holding a picture. Only one picture is
/// handled at a time: once a picture is active, other pictures are ignored until
/// every hand has let go.

use cgmath::Vector3;
use tracing::{debug, warn};

use crate::config::AlbumSettings;
use crate::error::AlbumError;
use crate::interaction::hands::{Hand, HandsFrame};
use crate::interaction::resize::{resize_record, ResizeHandle};
use crate::spatial::{distance_to_surface, pick_nearest, Anchor, AnchorFrames, Transform};
use crate::state::{AlbumStore, Pictures, RecordId};

/// Which hands hold the active picture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldState {
    Idle,
    SingleHold(Hand),
    DoubleHold,
}

/// What a fixed tick did
#[derive(Debug)]
pub struct TickOutcome {
    /// A hand started or stopped holding
    pub changed: bool,
    pub state: HoldState,
    /// Picture dropped by the last hand this tick
    pub released: Option<RecordId>,
    /// The dropped picture could not be written to the album document
    pub write_error: Option<AlbumError>,
}

/// Interaction state that lives across ticks
#[derive(Debug, Clone)]
pub struct InteractionContext {
    grip_latched: [bool; 2],
    holding: [bool; 2],
    active: Option<RecordId>,
    handle: ResizeHandle,
    album_root: Transform,
    hold_distance: f32,
    grip_threshold: f32,
    max_size: f32,
}

impl InteractionContext {
    pub fn new(settings: &AlbumSettings) -> Self {
        Self {
            grip_latched: [false; 2],
            holding: [false; 2],
            active: None,
            handle: ResizeHandle::default(),
            album_root: Transform::identity(),
            hold_distance: settings.hold_distance,
            grip_threshold: settings.grip_threshold,
            max_size: settings.max_size,
        }
    }

    /// Clear everything held; call on every scene change
    pub fn reset(&mut self) {
        self.grip_latched = [false; 2];
        self.holding = [false; 2];
        self.active = None;
        self.handle = ResizeHandle::default();
    }

    /// Drop a record that left the scene while it was held
    pub fn forget(&mut self, id: RecordId) {
        if self.active == Some(id) {
            debug!(%id, "held picture removed");
            self.active = None;
            self.holding = [false; 2];
        }
    }

    /// World transform of the object pictures are placed under
    pub fn set_album_root(&mut self, root: Transform) {
        self.album_root = root;
    }

    pub fn active(&self) -> Option<RecordId> {
        self.active
    }

    pub fn is_holding(&self, hand: Hand) -> bool {
        self.holding[hand.index()]
    }

    pub fn state(&self) -> HoldState {
        match self.holding {
            [true, true] => HoldState::DoubleHold,
            [true, false] => HoldState::SingleHold(Hand::Left),
            [false, true] => HoldState::SingleHold(Hand::Right),
            [false, false] => HoldState::Idle,
        }
    }

    /// World transforms of everything a picture can hang under
    pub fn anchors(&self, frame: &HandsFrame) -> AnchorFrames {
        AnchorFrames {
            album_root: self.album_root,
            left_hand: frame.world(Hand::Left),
            right_hand: frame.world(Hand::Right),
            resize_handle: self.handle.world(&frame.rig),
        }
    }

    /// Process grips and re-parent the active picture.
    ///
    /// When the last hand lets go, the picture's pose and size are written back
    /// to its record and to the album document.
    pub fn fixed_tick(&mut self, frame: &HandsFrame, pictures: &mut Pictures, store: &mut AlbumStore) -> TickOutcome {
        let anchors = self.anchors(frame);
        let mut changed = false;
        for hand in Hand::BOTH {
            changed |= self.process_hand(hand, frame, pictures, &anchors);
        }

        let mut outcome = TickOutcome {
            changed,
            state: self.state(),
            released: None,
            write_error: None,
        };
        if !changed {
            return outcome;
        }
        let Some(id) = self.active else {
            return outcome;
        };
        let Some(record) = pictures.get_mut(id) else {
            warn!(%id, "active picture is gone");
            self.forget(id);
            outcome.state = self.state();
            return outcome;
        };

        match outcome.state {
            HoldState::DoubleHold => {
                self.handle.update(&frame.left.pose, &frame.right.pose);
                let anchors = self.anchors(frame);
                if let Some(node) = record.node_mut() {
                    node.reparent(Anchor::ResizeHandle, &anchors);
                }
            }
            HoldState::SingleHold(hand) => {
                if let Some(node) = record.node_mut() {
                    node.reparent(Anchor::Hand(hand), &anchors);
                }
            }
            HoldState::Idle => {
                if let Some(node) = record.node_mut() {
                    node.reparent(Anchor::AlbumRoot, &anchors);
                }
                record.sync_from_node(&anchors);
                self.active = None;
                outcome.released = Some(id);
                debug!(path = %record.path, "picture released");

                if let Err(err) = store.update_record(record) {
                    warn!(path = %record.path, %err, "could not save released picture");
                    outcome.write_error = Some(err);
                }
            }
        }
        outcome
    }

    /// Update one hand's grip latch; true if its holding flag changed
    fn process_hand(&mut self, hand: Hand, frame: &HandsFrame, pictures: &Pictures, anchors: &AnchorFrames) -> bool {
        let i = hand.index();
        let closed = frame.input(hand).is_closed(self.grip_threshold);
        if closed == self.grip_latched[i] {
            return false;
        }
        self.grip_latched[i] = closed;

        let was_holding = self.holding[i];
        if !closed {
            self.holding[i] = false;
        } else {
            let point = anchors.get(Anchor::Hand(hand)).position;
            match self.active {
                Some(id) => self.holding[i] = self.within_reach(point, id, pictures, anchors),
                None => {
                    let candidates = pictures
                        .iter()
                        .filter_map(|record| Some((record.id, record.bounds(anchors)?)));
                    if let Some((id, distance)) = pick_nearest(point, candidates, self.hold_distance) {
                        debug!(hand = hand.name(), %id, distance, "picture grabbed");
                        self.active = Some(id);
                        self.holding[i] = true;
                    }
                }
            }
        }
        self.holding[i] != was_holding
    }

    fn within_reach(&self, point: Vector3<f32>, id: RecordId, pictures: &Pictures, anchors: &AnchorFrames) -> bool {
        pictures
            .get(id)
            .and_then(|record| record.bounds(anchors))
            .is_some_and(|bounds| distance_to_surface(point, &bounds) < self.hold_distance)
    }

    /// Resize the active picture while it is held with both hands; call every
    /// rendered frame. True if the picture was resized.
    pub fn frame_tick(&mut self, frame: &HandsFrame, pictures: &mut Pictures) -> bool {
        if self.state() != HoldState::DoubleHold {
            return false;
        }
        let Some(record) = self.active.and_then(|id| pictures.get_mut(id)) else {
            return false;
        };

        self.handle.update(&frame.left.pose, &frame.right.pose);
        let anchors = self.anchors(frame);
        resize_record(record, &anchors, self.max_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AlbumPaths;
    use crate::interaction::hands::HandInput;
    use crate::spatial::{FrameDimensions, PictureNode, Pose};
    use crate::state::visual::testing::{FakeImages, RecordingBuilder};
    use crate::state::{LiveHandle, PictureRecord, VisualId};
    use cgmath::InnerSpace;
    use serde_json::{json, Value};
    use std::fs;
    use tempfile::tempdir;

    const BORDER: f32 = 0.02;

    /// A 0.5 x 0.5 picture facing +z at `position`
    fn picture(name: &str, position: Vector3<f32>) -> PictureRecord {
        let settings = AlbumSettings::default();
        let mut record = PictureRecord::ephemeral(
            name,
            format!("/p/{name}").into(),
            position,
            Vector3::new(0.0, 0.0, 0.0),
            &settings,
        );
        let dims = FrameDimensions::from_width(0.5, BORDER, 1.0);
        record.width = dims.width;
        record.height = dims.height;
        let node = PictureNode::new(
            Transform::from_euler_degrees(position, record.rotation),
            dims,
            BORDER,
            record.thickness,
            1.0,
            true,
        );
        record.live = Some(LiveHandle {
            visual: VisualId(1),
            node,
        });
        record
    }

    fn hand(x: f32, y: f32, z: f32, closed: bool) -> HandInput {
        let value = if closed { 1.0 } else { 0.0 };
        HandInput::new(Pose::at(Vector3::new(x, y, z)), value, 0.0)
    }

    fn offline_store() -> (tempfile::TempDir, AlbumStore) {
        let dir = tempdir().unwrap();
        let store = AlbumStore::new(AlbumPaths::new(dir.path()), AlbumSettings::default());
        (dir, store)
    }

    #[test]
    fn test_nearest_picture_is_grabbed() {
        let (_dir, mut store) = offline_store();
        let mut pictures: Pictures = [
            picture("far.png", Vector3::new(0.0, 1.0, 0.0)),
            picture("near.png", Vector3::new(0.6, 1.0, 0.0)),
        ]
        .into_iter()
        .collect();
        let near = pictures.iter().nth(1).unwrap().id;

        // 1 cm from "near", 9 cm from "far"
        let frame = HandsFrame::new(hand(0.34, 1.0, 0.0, false), hand(5.0, 0.0, 0.0, true));
        let mut ctx = InteractionContext::new(&AlbumSettings::default());
        assert!(!ctx.fixed_tick(&frame, &mut pictures, &mut store).changed);

        let frame = HandsFrame::new(hand(0.34, 1.0, 0.0, true), hand(5.0, 0.0, 0.0, true));
        let outcome = ctx.fixed_tick(&frame, &mut pictures, &mut store);
        assert!(outcome.changed);
        assert_eq!(outcome.state, HoldState::SingleHold(Hand::Left));
        assert_eq!(ctx.active(), Some(near));
        assert_eq!(
            pictures.get(near).unwrap().node().unwrap().anchor,
            Anchor::Hand(Hand::Left)
        );
    }

    #[test]
    fn test_tie_goes_to_first_picture() {
        let (_dir, mut store) = offline_store();
        let mut pictures: Pictures = [
            picture("a.png", Vector3::new(-0.27, 1.0, 0.0)),
            picture("b.png", Vector3::new(0.27, 1.0, 0.0)),
        ]
        .into_iter()
        .collect();
        let first = pictures.iter().next().unwrap().id;

        let mut ctx = InteractionContext::new(&AlbumSettings::default());
        let frame = HandsFrame::new(hand(0.0, 1.0, 0.0, true), HandInput::default());
        ctx.fixed_tick(&frame, &mut pictures, &mut store);
        assert_eq!(ctx.active(), Some(first));
    }

    #[test]
    fn test_no_reselection_while_active() {
        let (_dir, mut store) = offline_store();
        let mut pictures: Pictures = [
            picture("a.png", Vector3::new(0.0, 1.0, 0.0)),
            picture("b.png", Vector3::new(2.0, 1.0, 0.0)),
        ]
        .into_iter()
        .collect();
        let a = pictures.iter().next().unwrap().id;
        let mut ctx = InteractionContext::new(&AlbumSettings::default());

        let frame = HandsFrame::new(hand(0.0, 1.0, -0.02, true), hand(2.0, 1.0, -0.02, false));
        ctx.fixed_tick(&frame, &mut pictures, &mut store);
        assert_eq!(ctx.active(), Some(a));

        // the right hand closes right on top of "b"
        let frame = HandsFrame::new(hand(0.0, 1.0, -0.02, true), hand(2.0, 1.0, -0.02, true));
        let outcome = ctx.fixed_tick(&frame, &mut pictures, &mut store);
        assert!(!outcome.changed);
        assert_eq!(ctx.active(), Some(a));
        assert!(!ctx.is_holding(Hand::Right));
        assert_eq!(ctx.state(), HoldState::SingleHold(Hand::Left));
    }

    #[test]
    fn test_both_hands_grab_in_one_tick() {
        let (_dir, mut store) = offline_store();
        let mut pictures: Pictures = [picture("a.png", Vector3::new(0.0, 1.0, 0.0))].into_iter().collect();
        let mut ctx = InteractionContext::new(&AlbumSettings::default());

        let frame = HandsFrame::new(hand(-0.2, 1.0, -0.02, true), hand(0.2, 1.0, -0.02, true));
        let outcome = ctx.fixed_tick(&frame, &mut pictures, &mut store);
        assert_eq!(outcome.state, HoldState::DoubleHold);
        let record = pictures.iter().next().unwrap();
        assert_eq!(record.node().unwrap().anchor, Anchor::ResizeHandle);
    }

    #[test]
    fn test_single_hand_move_and_release_writes_back() {
        let dir = tempdir().unwrap();
        let paths = AlbumPaths::new(dir.path());
        paths.ensure_dirs().unwrap();
        fs::write(paths.pictures_dir().join("a.png"), b"x").unwrap();
        fs::write(
            paths.document(),
            json!({"Gym": {"album": [{"path": "a.png", "position": [0, 1, 0], "rotation": [0, 0, 0]}]}})
                .to_string(),
        )
        .unwrap();

        let mut store = AlbumStore::new(paths.clone(), AlbumSettings::default());
        let mut pictures = store
            .load("Gym", &mut FakeImages::default(), &mut RecordingBuilder::default())
            .records;
        let id = pictures.iter().next().unwrap().id;
        let mut ctx = InteractionContext::new(store.settings());

        let frame = HandsFrame::new(hand(0.1, 1.0, -0.02, true), HandInput::default());
        ctx.fixed_tick(&frame, &mut pictures, &mut store);
        assert_eq!(ctx.active(), Some(id));

        // carry it half a meter to the right, then let go
        let frame = HandsFrame::new(hand(0.6, 1.0, -0.02, true), HandInput::default());
        assert!(!ctx.fixed_tick(&frame, &mut pictures, &mut store).changed);
        let frame = HandsFrame::new(hand(0.6, 1.0, -0.02, false), HandInput::default());
        let outcome = ctx.fixed_tick(&frame, &mut pictures, &mut store);

        assert_eq!(outcome.released, Some(id));
        assert!(outcome.write_error.is_none());
        assert_eq!(ctx.state(), HoldState::Idle);
        assert_eq!(ctx.active(), None);

        let record = pictures.get(id).unwrap();
        assert!((record.position - Vector3::new(0.5, 1.0, 0.0)).magnitude() < 1e-5);
        assert_eq!(record.node().unwrap().anchor, Anchor::AlbumRoot);

        let doc: Value = serde_json::from_str(&fs::read_to_string(paths.document()).unwrap()).unwrap();
        let entry = &doc["Gym"]["album"][0];
        assert!((entry["position"][0].as_f64().unwrap() - 0.5).abs() < 1e-5);
        assert!((entry["width"].as_f64().unwrap() - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_two_hand_stretch_resizes_width() {
        let (_dir, mut store) = offline_store();
        let mut pictures: Pictures = [picture("a.png", Vector3::new(0.0, 1.0, 0.0))].into_iter().collect();
        let id = pictures.iter().next().unwrap().id;
        let mut ctx = InteractionContext::new(&AlbumSettings::default());

        let frame = HandsFrame::new(hand(-0.2, 1.0, -0.02, true), hand(0.2, 1.0, -0.02, true));
        ctx.fixed_tick(&frame, &mut pictures, &mut store);
        assert!(ctx.frame_tick(&frame, &mut pictures));
        assert!((pictures.get(id).unwrap().width - 0.5).abs() < 1e-5);

        // hands twice as far apart
        let frame = HandsFrame::new(hand(-0.4, 1.0, -0.02, true), hand(0.4, 1.0, -0.02, true));
        assert!(ctx.frame_tick(&frame, &mut pictures));
        let record = pictures.get(id).unwrap();
        assert!((record.width - 1.0).abs() < 1e-4);
        assert!((record.height - 1.0).abs() < 1e-4);

        // release both: size goes into the record, not the (absent) entry
        let frame = HandsFrame::new(hand(-0.4, 1.0, -0.02, false), hand(0.4, 1.0, -0.02, false));
        let outcome = ctx.fixed_tick(&frame, &mut pictures, &mut store);
        assert_eq!(outcome.released, Some(id));
        let record = pictures.get(id).unwrap();
        assert!((record.width - 1.0).abs() < 1e-4);
        assert!(!ctx.frame_tick(&frame, &mut pictures));
    }

    #[test]
    fn test_resize_is_clamped() {
        let (_dir, mut store) = offline_store();
        let mut pictures: Pictures = [picture("a.png", Vector3::new(0.0, 1.0, 0.0))].into_iter().collect();
        let id = pictures.iter().next().unwrap().id;
        let mut settings = AlbumSettings::default();
        settings.max_size = 0.8;
        let mut ctx = InteractionContext::new(&settings);

        let frame = HandsFrame::new(hand(-0.2, 1.0, -0.02, true), hand(0.2, 1.0, -0.02, true));
        ctx.fixed_tick(&frame, &mut pictures, &mut store);
        let frame = HandsFrame::new(hand(-1.0, 1.0, -0.02, true), hand(1.0, 1.0, -0.02, true));
        ctx.frame_tick(&frame, &mut pictures);
        assert!((pictures.get(id).unwrap().width - 0.8).abs() < 1e-4);
    }

    #[test]
    fn test_forget_and_reset() {
        let (_dir, mut store) = offline_store();
        let mut pictures: Pictures = [picture("a.png", Vector3::new(0.0, 1.0, 0.0))].into_iter().collect();
        let id = pictures.iter().next().unwrap().id;
        let mut ctx = InteractionContext::new(&AlbumSettings::default());

        let frame = HandsFrame::new(hand(0.0, 1.0, -0.02, true), HandInput::default());
        ctx.fixed_tick(&frame, &mut pictures, &mut store);
        assert_eq!(ctx.active(), Some(id));

        pictures.remove(id);
        ctx.forget(id);
        assert_eq!(ctx.state(), HoldState::Idle);
        assert_eq!(ctx.active(), None);

        ctx.reset();
        // the grip latch was cleared, so a still-closed hand is a fresh press
        let outcome = ctx.fixed_tick(&frame, &mut pictures, &mut store);
        assert!(!outcome.changed);
        assert_eq!(ctx.active(), None);
    }

    #[test]
    fn test_hidden_picture_can_still_be_grabbed() {
        let (_dir, mut store) = offline_store();
        let mut record = picture("a.png", Vector3::new(0.0, 1.0, 0.0));
        record.visible = false;
        let mut pictures: Pictures = [record].into_iter().collect();
        let mut ctx = InteractionContext::new(&AlbumSettings::default());

        let frame = HandsFrame::new(hand(0.0, 1.0, -0.02, true), HandInput::default());
        assert!(ctx.fixed_tick(&frame, &mut pictures, &mut store).changed);
    }
}

use scrubber::ThumbnailSequence;
use scrubber::thumbnail::ThumbnailImage;
use scrubber::time::format_timestamp;

pub const DEFAULT_LABEL_WIDTH_PX: f32 = 48.0;

/// Pixel geometry of the timeline strip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelineLayout {
    pub width: f32,
    pub playhead_width: f32,
    pub label_width: f32,
}

impl TimelineLayout {
    pub fn new(width: f32, playhead_width: f32) -> Self {
        Self {
            width: width.max(0.0),
            playhead_width: playhead_width.max(0.0),
            label_width: DEFAULT_LABEL_WIDTH_PX,
        }
    }
}

/// Inputs of one rendered frame.
#[derive(Debug, Clone, Copy)]
pub struct TimelineFrame<'a> {
    pub progress: f64,
    pub display_time: f64,
    pub thumbnails: &'a ThumbnailSequence,
    pub loading: bool,
    pub label_opacity: f64,
}

/// One slot of the thumbnail strip; `image` is `None` for a placeholder.
#[derive(Debug, Clone, PartialEq)]
pub struct StripCell {
    pub index: usize,
    pub x: f32,
    pub width: f32,
    pub image: Option<ThumbnailImage>,
}

/// Floating time label above the playhead.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeLabel {
    pub text: String,
    pub x: f32,
    pub opacity: f32,
}

/// Values needed to draw the strip, progress fill, playhead and label.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineRenderModel {
    pub cells: Vec<StripCell>,
    pub fill_width: f32,
    pub playhead_x: f32,
    pub label: TimeLabel,
    pub loading: bool,
}

/// Builds draw data for the timeline.
pub fn build_render_model(layout: &TimelineLayout, frame: &TimelineFrame<'_>) -> TimelineRenderModel {
    let width = layout.width.max(0.0);
    let progress = if frame.progress.is_nan() {
        0.0
    } else {
        frame.progress.clamp(0.0, 1.0) as f32
    };

    let playhead_x = progress * (width - layout.playhead_width).max(0.0);
    let fill_width = progress * width;

    let slots = frame.thumbnails.slots();
    let cell_width = if slots.is_empty() {
        0.0
    } else {
        width / slots.len() as f32
    };
    let cells = slots
        .iter()
        .enumerate()
        .map(|(index, slot)| StripCell {
            index,
            x: index as f32 * cell_width,
            width: cell_width,
            image: slot.clone(),
        })
        .collect();

    let label_center = playhead_x + layout.playhead_width / 2.0;
    let label_x = (label_center - layout.label_width / 2.0)
        .min(width - layout.label_width)
        .max(0.0);

    TimelineRenderModel {
        cells,
        fill_width,
        playhead_x,
        label: TimeLabel {
            text: format_timestamp(frame.display_time),
            x: label_x,
            opacity: frame.label_opacity.clamp(0.0, 1.0) as f32,
        },
        loading: frame.loading,
    }
}

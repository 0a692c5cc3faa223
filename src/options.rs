//! Observable tracking options.
//!
//! `Options` holds the match-quality thresholds, template mask geometry,
//! adaptation rate, prediction switch and failure tolerance used by the
//! tracker. Every setter that changes a value publishes an [`OptionChange`]
//! with the old and new values to all subscribers. Options never rewrite
//! frames that were already tracked; a change only affects frames computed
//! after it, and geometry changes only take effect at the next key frame.

use crate::util::{TrackError, TrackResult};
use std::fmt;

/// Score at or below which a match is discarded as noise.
pub const POSSIBLE_MATCH: f32 = 1.0;

/// Number of preceding frames used for motion prediction.
pub const PREDICTION_LOOK_BACK: usize = 4;

/// Upper end of the evolve-rate scale.
pub const MAX_EVOLVE_RATE: u32 = 100;

/// Geometric shape of the template mask.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MaskShape {
    #[default]
    Ellipse,
    Rectangle,
}

/// Search dimensionality selected by `line_spread`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackingMode {
    /// Full 2-D mask and area search.
    Area,
    /// Band of `spread` pixels along a line, searched along that line.
    Line { spread: usize },
}

/// Plain snapshot of all option values.
///
/// This is the form a persistence layer reads and writes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OptionValues {
    pub good_match: f32,
    pub evolve_alpha: u8,
    pub auto_skip_count: usize,
    pub line_spread: i32,
    pub line_angle_deg: f32,
    pub mask_shape: MaskShape,
    pub mask_width: usize,
    pub mask_height: usize,
    pub look_ahead: bool,
    pub search_margin: usize,
}

impl Default for OptionValues {
    fn default() -> Self {
        Self {
            good_match: 4.0,
            evolve_alpha: evolve_alpha_from_rate(20),
            auto_skip_count: 2,
            line_spread: -1,
            line_angle_deg: 0.0,
            mask_shape: MaskShape::Ellipse,
            mask_width: 16,
            mask_height: 16,
            look_ahead: true,
            search_margin: 8,
        }
    }
}

impl OptionValues {
    /// Tracking mode implied by `line_spread`.
    pub fn mode(&self) -> TrackingMode {
        if self.line_spread > 0 {
            TrackingMode::Line {
                spread: self.line_spread as usize,
            }
        } else {
            TrackingMode::Area
        }
    }

    fn validate(&self) -> TrackResult<()> {
        check_good_match(self.good_match)?;
        check_mask_size(self.mask_width, self.mask_height)?;
        if !self.line_angle_deg.is_finite() {
            return Err(TrackError::InvalidOption {
                name: "line_angle_deg",
                reason: "must be finite",
            });
        }
        Ok(())
    }
}

/// A single option mutation with its previous and new value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum OptionChange {
    GoodMatch { old: f32, new: f32 },
    EvolveAlpha { old: u8, new: u8 },
    AutoSkipCount { old: usize, new: usize },
    LineSpread { old: i32, new: i32 },
    LineAngle { old: f32, new: f32 },
    MaskShape { old: MaskShape, new: MaskShape },
    MaskWidth { old: usize, new: usize },
    MaskHeight { old: usize, new: usize },
    LookAhead { old: bool, new: bool },
    SearchMargin { old: usize, new: usize },
}

impl OptionChange {
    /// Field name as used in configuration files.
    pub fn field(&self) -> &'static str {
        match self {
            Self::GoodMatch { .. } => "good_match",
            Self::EvolveAlpha { .. } => "evolve_alpha",
            Self::AutoSkipCount { .. } => "auto_skip_count",
            Self::LineSpread { .. } => "line_spread",
            Self::LineAngle { .. } => "line_angle_deg",
            Self::MaskShape { .. } => "mask_shape",
            Self::MaskWidth { .. } => "mask_width",
            Self::MaskHeight { .. } => "mask_height",
            Self::LookAhead { .. } => "look_ahead",
            Self::SearchMargin { .. } => "search_margin",
        }
    }

    /// True for changes that only apply once a new key frame is captured.
    pub fn affects_geometry(&self) -> bool {
        matches!(
            self,
            Self::LineSpread { .. }
                | Self::LineAngle { .. }
                | Self::MaskShape { .. }
                | Self::MaskWidth { .. }
                | Self::MaskHeight { .. }
        )
    }
}

/// Handle returned by [`Options::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&OptionChange) + Send>;

/// Mutable, observable tracking configuration.
pub struct Options {
    values: OptionValues,
    listeners: Vec<(ListenerId, Listener)>,
    next_id: u64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            values: OptionValues::default(),
            listeners: Vec::new(),
            next_id: 0,
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("values", &self.values)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Options {
    /// Creates options from a validated snapshot.
    pub fn from_values(values: OptionValues) -> TrackResult<Self> {
        values.validate()?;
        Ok(Self {
            values,
            listeners: Vec::new(),
            next_id: 0,
        })
    }

    /// Returns a copy of the current values.
    pub fn values(&self) -> OptionValues {
        self.values
    }

    /// Registers a listener called after every effective change.
    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&OptionChange) + Send + 'static,
    {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Removes a listener; returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    /// Applies every field of `values`, notifying once per changed field.
    ///
    /// Nothing is applied if any value is invalid.
    pub fn apply(&mut self, values: OptionValues) -> TrackResult<()> {
        values.validate()?;
        self.set_good_match(values.good_match)?;
        self.set_evolve_alpha(values.evolve_alpha);
        self.set_auto_skip_count(values.auto_skip_count);
        self.set_line_spread(values.line_spread);
        self.set_line_angle_deg(values.line_angle_deg)?;
        self.set_mask_shape(values.mask_shape);
        self.set_mask_size(values.mask_width, values.mask_height)?;
        self.set_look_ahead(values.look_ahead);
        self.set_search_margin(values.search_margin);
        Ok(())
    }

    pub fn good_match(&self) -> f32 {
        self.values.good_match
    }

    /// Sets the score above which a match is trusted.
    ///
    /// Must be finite and not below [`POSSIBLE_MATCH`].
    pub fn set_good_match(&mut self, value: f32) -> TrackResult<()> {
        check_good_match(value)?;
        if let Some(old) = replace(&mut self.values.good_match, value) {
            self.notify(OptionChange::GoodMatch { old, new: value });
        }
        Ok(())
    }

    pub fn evolve_alpha(&self) -> u8 {
        self.values.evolve_alpha
    }

    pub fn set_evolve_alpha(&mut self, value: u8) {
        if let Some(old) = replace(&mut self.values.evolve_alpha, value) {
            self.notify(OptionChange::EvolveAlpha { old, new: value });
        }
    }

    /// Evolve rate in `0..=100` corresponding to the current alpha.
    pub fn evolve_rate(&self) -> u32 {
        (u32::from(self.values.evolve_alpha) * MAX_EVOLVE_RATE + 127) / 255
    }

    /// Sets alpha from a rate in `0..=100`; larger rates saturate at 100.
    pub fn set_evolve_rate(&mut self, rate: u32) {
        self.set_evolve_alpha(evolve_alpha_from_rate(rate));
    }

    pub fn auto_skip_count(&self) -> usize {
        self.values.auto_skip_count
    }

    pub fn set_auto_skip_count(&mut self, value: usize) {
        if let Some(old) = replace(&mut self.values.auto_skip_count, value) {
            self.notify(OptionChange::AutoSkipCount { old, new: value });
        }
    }

    pub fn line_spread(&self) -> i32 {
        self.values.line_spread
    }

    /// Positive values select 1-D tracking with a band that many pixels wide.
    pub fn set_line_spread(&mut self, value: i32) {
        if let Some(old) = replace(&mut self.values.line_spread, value) {
            self.notify(OptionChange::LineSpread { old, new: value });
        }
    }

    pub fn line_angle_deg(&self) -> f32 {
        self.values.line_angle_deg
    }

    pub fn set_line_angle_deg(&mut self, value: f32) -> TrackResult<()> {
        if !value.is_finite() {
            return Err(TrackError::InvalidOption {
                name: "line_angle_deg",
                reason: "must be finite",
            });
        }
        if let Some(old) = replace(&mut self.values.line_angle_deg, value) {
            self.notify(OptionChange::LineAngle { old, new: value });
        }
        Ok(())
    }

    pub fn mask_shape(&self) -> MaskShape {
        self.values.mask_shape
    }

    pub fn set_mask_shape(&mut self, value: MaskShape) {
        if let Some(old) = replace(&mut self.values.mask_shape, value) {
            self.notify(OptionChange::MaskShape { old, new: value });
        }
    }

    pub fn mask_width(&self) -> usize {
        self.values.mask_width
    }

    pub fn mask_height(&self) -> usize {
        self.values.mask_height
    }

    /// Sets both mask dimensions; zero is rejected.
    pub fn set_mask_size(&mut self, width: usize, height: usize) -> TrackResult<()> {
        check_mask_size(width, height)?;
        if let Some(old) = replace(&mut self.values.mask_width, width) {
            self.notify(OptionChange::MaskWidth { old, new: width });
        }
        if let Some(old) = replace(&mut self.values.mask_height, height) {
            self.notify(OptionChange::MaskHeight { old, new: height });
        }
        Ok(())
    }

    pub fn set_mask_width(&mut self, width: usize) -> TrackResult<()> {
        self.set_mask_size(width, self.values.mask_height)
    }

    pub fn set_mask_height(&mut self, height: usize) -> TrackResult<()> {
        self.set_mask_size(self.values.mask_width, height)
    }

    pub fn look_ahead(&self) -> bool {
        self.values.look_ahead
    }

    pub fn set_look_ahead(&mut self, value: bool) {
        if let Some(old) = replace(&mut self.values.look_ahead, value) {
            self.notify(OptionChange::LookAhead { old, new: value });
        }
    }

    pub fn search_margin(&self) -> usize {
        self.values.search_margin
    }

    pub fn set_search_margin(&mut self, value: usize) {
        if let Some(old) = replace(&mut self.values.search_margin, value) {
            self.notify(OptionChange::SearchMargin { old, new: value });
        }
    }

    /// Tracking mode implied by the current `line_spread`.
    pub fn mode(&self) -> TrackingMode {
        self.values.mode()
    }

    fn notify(&mut self, change: OptionChange) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(&change);
        }
    }
}

/// Maps an evolve rate in `0..=100` linearly onto alpha `0..=255`.
pub fn evolve_alpha_from_rate(rate: u32) -> u8 {
    let rate = rate.min(MAX_EVOLVE_RATE);
    ((rate * 255 + MAX_EVOLVE_RATE / 2) / MAX_EVOLVE_RATE) as u8
}

fn replace<T: Copy + PartialEq>(slot: &mut T, value: T) -> Option<T> {
    if *slot == value {
        None
    } else {
        Some(std::mem::replace(slot, value))
    }
}

fn check_good_match(value: f32) -> TrackResult<()> {
    if !value.is_finite() {
        return Err(TrackError::InvalidOption {
            name: "good_match",
            reason: "must be finite",
        });
    }
    if value < POSSIBLE_MATCH {
        return Err(TrackError::InvalidOption {
            name: "good_match",
            reason: "must not be below the possible-match floor",
        });
    }
    Ok(())
}

fn check_mask_size(width: usize, height: usize) -> TrackResult<()> {
    if width == 0 || height == 0 {
        return Err(TrackError::InvalidMaskGeometry { width, height });
    }
    Ok(())
}

use crate::error::BindingError;
use crate::widgets::gui::{IndicatorHandle, ScreenHandle, SeriesHandle, WidgetHandle};

/// Remote identifier of a scalar variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VariableRef {
    pub name: String,
}

impl VariableRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl From<&str> for VariableRef {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Widget class plus the child handles that class needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetKind {
    Label,
    /// One series per bound variable.
    Chart { series: Vec<SeriesHandle> },
    Bar,
    /// One indicator per bound variable.
    Meter { indicators: Vec<IndicatorHandle> },
    Arc,
    Slider,
    Switch,
}

impl WidgetKind {
    pub fn name(&self) -> &'static str {
        match self {
            WidgetKind::Label => "label",
            WidgetKind::Chart { .. } => "chart",
            WidgetKind::Bar => "bar",
            WidgetKind::Meter { .. } => "meter",
            WidgetKind::Arc => "arc",
            WidgetKind::Slider => "slider",
            WidgetKind::Switch => "switch",
        }
    }

    fn children(&self) -> Option<usize> {
        match self {
            WidgetKind::Chart { series } => Some(series.len()),
            WidgetKind::Meter { indicators } => Some(indicators.len()),
            _ => None,
        }
    }
}

/// Remote method a binding is polled with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiMethod {
    #[default]
    ReadVariable,
    WriteVariable,
}

/// Association of remote variables with one widget on one screen.
///
/// Shared as `Arc<WidgetBinding>`; the cache keys entries on the `Arc` pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetBinding {
    pub widget: WidgetHandle,
    pub kind: WidgetKind,
    pub variables: Vec<VariableRef>,
    pub screen: ScreenHandle,
    pub api: ApiMethod,
}

impl WidgetBinding {
    pub fn new(
        widget: WidgetHandle,
        kind: WidgetKind,
        variables: Vec<VariableRef>,
        screen: ScreenHandle,
    ) -> Result<Self, BindingError> {
        if variables.is_empty() {
            return Err(BindingError::NoVariables);
        }
        if let Some(children) = kind.children()
            && children != variables.len()
        {
            return Err(BindingError::ChildCountMismatch {
                kind: kind.name(),
                variables: variables.len(),
                children,
            });
        }
        Ok(Self {
            widget,
            kind,
            variables,
            screen,
            api: ApiMethod::ReadVariable,
        })
    }

    pub fn with_api(mut self, api: ApiMethod) -> Self {
        self.api = api;
        self
    }

    pub fn variable_names(&self) -> Vec<&str> {
        self.variables.iter().map(|v| v.name.as_str()).collect()
    }
}

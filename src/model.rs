use ratatui::style::Color;
use std::fmt::{Display, Formatter};

/// Column titles, in the order every row carries its fields.
pub const HEADER: [&str; 7] = ["Type", "Namespace", "Name", "Status", "Node", "IPs", "Age"];

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum ResourceKind {
    Node,
    Service,
    Deployment,
    Pod,
}

impl ResourceKind {
    pub const ALL: [Self; 4] = [Self::Node, Self::Service, Self::Deployment, Self::Pod];

    pub fn tag(self) -> &'static str {
        match self {
            Self::Node => "[node]",
            Self::Service => "[svc]",
            Self::Deployment => "[deploy]",
            Self::Pod => "[pod]",
        }
    }

    /// Nodes are cluster-scoped and never hidden as system resources.
    pub fn namespaced(self) -> bool {
        !matches!(self, Self::Node)
    }
}

impl Display for ResourceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Node => "nodes",
            Self::Service => "services",
            Self::Deployment => "deployments",
            Self::Pod => "pods",
        };
        write!(f, "{name}")
    }
}

/// Foreground colors available to rows.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Tint {
    Red,
    Yellow,
    Blue,
    Magenta,
    Cyan,
}

impl Tint {
    pub fn color(self) -> Color {
        match self {
            Self::Red => Color::Red,
            Self::Yellow => Color::Yellow,
            Self::Blue => Color::Blue,
            Self::Magenta => Color::Magenta,
            Self::Cyan => Color::Cyan,
        }
    }

    /// SGR foreground code.
    pub fn ansi_code(self) -> u8 {
        match self {
            Self::Red => 31,
            Self::Yellow => 33,
            Self::Blue => 34,
            Self::Magenta => 35,
            Self::Cyan => 36,
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Palette {
    pub node: Tint,
    pub service: Tint,
    pub deployment: Tint,
    pub pod: Tint,
    pub failed: Tint,
}

impl Palette {
    pub fn for_kind(&self, kind: ResourceKind) -> Tint {
        match kind {
            ResourceKind::Node => self.node,
            ResourceKind::Service => self.service,
            ResourceKind::Deployment => self.deployment,
            ResourceKind::Pod => self.pod,
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            node: Tint::Yellow,
            service: Tint::Blue,
            deployment: Tint::Magenta,
            pod: Tint::Cyan,
            failed: Tint::Red,
        }
    }
}

/// One pre-formatted, colored table cell.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Field {
    text: String,
    tint: Tint,
    rendered: String,
}

impl Field {
    pub fn new(text: impl Into<String>, tint: Tint) -> Self {
        let text = text.into();
        let rendered = format!("\x1b[{}m{text}\x1b[0m", tint.ansi_code());
        Self {
            text,
            tint,
            rendered,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tint(&self) -> Tint {
        self.tint
    }

    /// The color-annotated form, as it would be written to a plain terminal.
    pub fn rendered(&self) -> &str {
        &self.rendered
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Row {
    fields: Vec<Field>,
}

impl Row {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn field(&self, index: usize) -> Option<&Field> {
        self.fields.get(index)
    }
}

impl Ord for Row {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.fields
            .iter()
            .map(Field::rendered)
            .cmp(other.fields.iter().map(Field::rendered))
    }
}

impl PartialOrd for Row {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// All rows gathered during one refresh cycle.
pub type Snapshot = Vec<Row>;

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum NamespaceScope {
    All,
    Named(String),
}

impl NamespaceScope {
    pub fn from_filter(namespace: Option<&str>) -> Self {
        match namespace {
            Some(namespace) => Self::Named(namespace.to_string()),
            None => Self::All,
        }
    }

    pub fn admits(&self, namespace: &str) -> bool {
        match self {
            Self::All => true,
            Self::Named(expected) => expected == namespace,
        }
    }
}

impl Display for NamespaceScope {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Named(namespace) => write!(f, "{namespace}"),
        }
    }
}

//! Program interfaces.
//!
//! Every bucket variant statically describes, per named program, which
//! buffers exist and how a vertex record is computed from the arguments the
//! tessellation code passes in. This description drives array creation and
//! the synthesis of specialized insertion methods.
//!
//! # Example
//!
//! ```
//! use tilepack_core::array::ComponentType;
//! use tilepack_core::program::{arg, AttributeSpec, ProgramInterface};
//!
//! let circle = ProgramInterface::vertex(
//!     ["x", "y", "extrude_x", "extrude_y"],
//!     vec![AttributeSpec::new(
//!         "pos",
//!         ComponentType::Int16,
//!         vec![
//!             arg("x") * 2.0 + (arg("extrude_x") + 1.0) / 2.0,
//!             arg("y") * 2.0 + (arg("extrude_y") + 1.0) / 2.0,
//!         ],
//!     )],
//! )
//! .with_element_buffer(3);
//!
//! assert!(circle.vertex_buffer);
//! assert!(circle.element_buffer);
//! assert!(!circle.second_element_buffer);
//! ```

use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

use crate::array::{ComponentType, StructArrayType, VERTEX_ATTRIBUTE_ALIGNMENT};

/// Default number of indices per element record (triangles).
pub const DEFAULT_ELEMENT_COMPONENTS: usize = 3;

/// Expression computing one attribute component from the method arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueExpr {
    /// A formal argument, by name.
    Arg(String),
    /// A constant.
    Const(f64),
    Add(Box<ValueExpr>, Box<ValueExpr>),
    Sub(Box<ValueExpr>, Box<ValueExpr>),
    Mul(Box<ValueExpr>, Box<ValueExpr>),
    Div(Box<ValueExpr>, Box<ValueExpr>),
    Neg(Box<ValueExpr>),
    /// Round toward negative infinity.
    Floor(Box<ValueExpr>),
}

/// Reference a formal argument.
pub fn arg(name: &str) -> ValueExpr {
    ValueExpr::Arg(name.to_string())
}

/// A constant expression.
pub fn lit(value: f64) -> ValueExpr {
    ValueExpr::Const(value)
}

impl ValueExpr {
    /// Round the expression toward negative infinity.
    pub fn floor(self) -> Self {
        Self::Floor(Box::new(self))
    }
}

impl From<f64> for ValueExpr {
    fn from(value: f64) -> Self {
        Self::Const(value)
    }
}

impl From<&str> for ValueExpr {
    fn from(name: &str) -> Self {
        arg(name)
    }
}

macro_rules! impl_binary_op {
    ($trait:ident, $method:ident, $variant:ident) => {
        impl<T: Into<ValueExpr>> $trait<T> for ValueExpr {
            type Output = ValueExpr;

            fn $method(self, rhs: T) -> ValueExpr {
                ValueExpr::$variant(Box::new(self), Box::new(rhs.into()))
            }
        }
    };
}

impl_binary_op!(Add, add, Add);
impl_binary_op!(Sub, sub, Sub);
impl_binary_op!(Mul, mul, Mul);
impl_binary_op!(Div, div, Div);

impl Neg for ValueExpr {
    type Output = ValueExpr;

    fn neg(self) -> ValueExpr {
        ValueExpr::Neg(Box::new(self))
    }
}

impl fmt::Display for ValueExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Arg(name) => write!(f, "{name}"),
            // Debug formatting keeps every bit of the constant.
            Self::Const(value) => write!(f, "{value:?}"),
            Self::Add(l, r) => write!(f, "({l} + {r})"),
            Self::Sub(l, r) => write!(f, "({l} - {r})"),
            Self::Mul(l, r) => write!(f, "({l} * {r})"),
            Self::Div(l, r) => write!(f, "({l} / {r})"),
            Self::Neg(e) => write!(f, "-{e}"),
            Self::Floor(e) => write!(f, "floor({e})"),
        }
    }
}

/// One vertex attribute of a program.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeSpec {
    /// Attribute name, also the struct member name.
    pub name: String,
    /// Scalar type of each component.
    pub component_type: ComponentType,
    /// Number of components.
    pub components: usize,
    /// One expression per component.
    pub value: Vec<ValueExpr>,
}

impl AttributeSpec {
    /// Create an attribute with one component per value expression.
    pub fn new(name: &str, component_type: ComponentType, value: Vec<ValueExpr>) -> Self {
        Self {
            name: name.to_string(),
            component_type,
            components: value.len(),
            value,
        }
    }

    /// Override the declared component count.
    pub fn with_components(mut self, components: usize) -> Self {
        self.components = components;
        self
    }
}

/// Static description of one program's buffers.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramInterface {
    /// Whether the program has a vertex buffer.
    pub vertex_buffer: bool,
    /// Vertex attributes, in record order.
    pub attributes: Vec<AttributeSpec>,
    /// Formal parameters of the vertex insertion method.
    pub attribute_args: Vec<String>,
    /// Whether the program has an element (index) buffer.
    pub element_buffer: bool,
    /// Indices per element record.
    pub element_buffer_components: usize,
    /// Whether the program has a second element buffer.
    pub second_element_buffer: bool,
    /// Indices per second element record.
    pub second_element_buffer_components: usize,
}

impl Default for ProgramInterface {
    fn default() -> Self {
        Self {
            vertex_buffer: false,
            attributes: Vec::new(),
            attribute_args: Vec::new(),
            element_buffer: false,
            element_buffer_components: DEFAULT_ELEMENT_COMPONENTS,
            second_element_buffer: false,
            second_element_buffer_components: DEFAULT_ELEMENT_COMPONENTS,
        }
    }
}

impl ProgramInterface {
    /// A program with a vertex buffer and no index buffers.
    pub fn vertex<'a>(
        attribute_args: impl IntoIterator<Item = &'a str>,
        attributes: Vec<AttributeSpec>,
    ) -> Self {
        Self {
            vertex_buffer: true,
            attributes,
            attribute_args: attribute_args.into_iter().map(str::to_string).collect(),
            ..Self::default()
        }
    }

    /// Add an element buffer with `components` indices per record.
    pub fn with_element_buffer(mut self, components: usize) -> Self {
        self.element_buffer = true;
        self.element_buffer_components = components;
        self
    }

    /// Add a second element buffer with `components` indices per record.
    pub fn with_second_element_buffer(mut self, components: usize) -> Self {
        self.second_element_buffer = true;
        self.second_element_buffer_components = components;
        self
    }

    /// Record layout of the vertex array.
    pub fn vertex_array_type(&self) -> StructArrayType {
        StructArrayType::new(
            self.attributes
                .iter()
                .map(|attr| (attr.name.as_str(), attr.component_type, attr.components)),
            VERTEX_ATTRIBUTE_ALIGNMENT,
        )
    }
}

/// Ordered registry of a variant's programs.
#[derive(Debug, Clone, Default)]
pub struct ProgramInterfaces {
    programs: Vec<(String, ProgramInterface)>,
}

impl ProgramInterfaces {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a program.
    pub fn with_program(mut self, name: &str, interface: ProgramInterface) -> Self {
        debug_assert!(self.get(name).is_none(), "program '{name}' registered twice");
        self.programs.push((name.to_string(), interface));
        self
    }

    /// Look up a program by name.
    pub fn get(&self, name: &str) -> Option<&ProgramInterface> {
        self.programs
            .iter()
            .find(|(program, _)| program == name)
            .map(|(_, interface)| interface)
    }

    /// Iterate programs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ProgramInterface)> {
        self.programs
            .iter()
            .map(|(name, interface)| (name.as_str(), interface))
    }

    /// Program names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.programs.iter().map(|(name, _)| name.as_str())
    }

    /// Number of programs.
    pub fn len(&self) -> usize {
        self.programs.len()
    }

    /// Whether no programs are registered.
    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }
}

/// Which of a program's buffers is meant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferRole {
    Vertex,
    Element,
    SecondElement,
}

impl BufferRole {
    /// Suffix appended to the program name.
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Vertex => "Vertex",
            Self::Element => "Element",
            Self::SecondElement => "SecondElement",
        }
    }
}

/// Name of a program's buffer, e.g. `circleVertex`.
pub fn buffer_name(program: &str, role: BufferRole) -> String {
    format!("{program}{}", role.suffix())
}

/// Name of the method adding a record to a program's buffer, e.g.
/// `addCircleVertex`.
pub fn add_method_name(program: &str, role: BufferRole) -> String {
    format!("add{}{}", capitalize(program), role.suffix())
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

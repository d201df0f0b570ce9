//! Insertion method synthesis.
//!
//! Tessellation calls a vertex insertion method once per emitted vertex, so
//! the method must not look up attributes or interpret the program interface
//! on every call. [`MethodCache`] compiles each distinct attribute layout
//! once into a [`VertexAddMethod`]: a flat list of component writers with
//! precomputed byte offsets and pre-built value closures.
//!
//! Methods are cached process-wide by their [`MethodSignature`], the literal
//! structure of the specialization. Structurally identical program
//! interfaces, whichever variant or bucket instance declares them, share one
//! `Arc<VertexAddMethod>`.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

use crate::array::{ComponentType, StructArray, StructArrayType};
use crate::error::{BucketError, BucketResult};
use crate::program::{ProgramInterface, ValueExpr};

type ValueFn = Box<dyn Fn(&[f64]) -> f64 + Send + Sync>;

/// Structural identity of a vertex insertion method.
///
/// Rendered from the argument list and every member's type, component
/// count, and value expressions. Two interfaces with equal signatures
/// produce byte-identical records for the same arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodSignature(String);

impl MethodSignature {
    /// Compute the signature of a program's vertex insertion method.
    pub fn of(interface: &ProgramInterface) -> Self {
        let mut signature = format!("({})", interface.attribute_args.join(", "));
        for attr in &interface.attributes {
            let values: Vec<String> = attr.value.iter().map(ToString::to_string).collect();
            signature.push_str(&format!(
                " {}:{}x{}=[{}]",
                attr.name,
                attr.component_type.name(),
                attr.components,
                values.join(", ")
            ));
        }
        Self(signature)
    }

    /// The rendered signature.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

struct ComponentWriter {
    offset: usize,
    component_type: ComponentType,
    value: ValueFn,
}

/// A compiled vertex insertion method.
pub struct VertexAddMethod {
    signature: MethodSignature,
    array_type: StructArrayType,
    arity: usize,
    writers: Vec<ComponentWriter>,
}

impl VertexAddMethod {
    /// Compile the insertion method for `interface`.
    ///
    /// Fails if an expression references an argument missing from the
    /// formal parameter list, or if an attribute's value list does not
    /// match its declared component count.
    pub fn compile(program: &str, interface: &ProgramInterface) -> BucketResult<Self> {
        let malformed = |reason: String| BucketError::MalformedProgramInterface {
            program: program.to_string(),
            reason,
        };

        let array_type = interface.vertex_array_type();
        let mut writers = Vec::new();

        for (attr, member) in interface.attributes.iter().zip(&array_type.members) {
            if attr.value.len() != attr.components {
                return Err(malformed(format!(
                    "attribute '{}' declares {} components but has {} values",
                    attr.name,
                    attr.components,
                    attr.value.len()
                )));
            }

            for (component, expr) in attr.value.iter().enumerate() {
                writers.push(ComponentWriter {
                    offset: member.offset + component * member.component_type.size(),
                    component_type: member.component_type,
                    value: compile_expr(expr, &interface.attribute_args).map_err(&malformed)?,
                });
            }
        }

        Ok(Self {
            signature: MethodSignature::of(interface),
            array_type,
            arity: interface.attribute_args.len(),
            writers,
        })
    }

    /// The structural signature of this method.
    pub fn signature(&self) -> &MethodSignature {
        &self.signature
    }

    /// Number of arguments the method expects.
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// The record layout this method writes.
    pub fn array_type(&self) -> &StructArrayType {
        &self.array_type
    }

    /// Append one record computed from `args` and return its index.
    #[inline]
    pub fn emplace(&self, array: &mut StructArray, args: &[f64]) -> usize {
        debug_assert_eq!(args.len(), self.arity, "{}", self.signature.as_str());
        debug_assert_eq!(array.array_type().size, self.array_type.size);

        let (index, record) = array.emplace_back();
        for writer in &self.writers {
            writer
                .component_type
                .write(&mut record[writer.offset..], (writer.value)(args));
        }
        index
    }
}

impl std::fmt::Debug for VertexAddMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VertexAddMethod")
            .field("signature", &self.signature.as_str())
            .field("stride", &self.array_type.size)
            .finish_non_exhaustive()
    }
}

fn compile_expr(expr: &ValueExpr, args: &[String]) -> Result<ValueFn, String> {
    let value: ValueFn = match expr {
        ValueExpr::Arg(name) => {
            let index = args
                .iter()
                .position(|a| a == name)
                .ok_or_else(|| format!("unknown argument '{name}'"))?;
            Box::new(move |a: &[f64]| a[index])
        }
        ValueExpr::Const(value) => {
            let value = *value;
            Box::new(move |_: &[f64]| value)
        }
        ValueExpr::Add(l, r) => {
            let (l, r) = (compile_expr(l, args)?, compile_expr(r, args)?);
            Box::new(move |a: &[f64]| l(a) + r(a))
        }
        ValueExpr::Sub(l, r) => {
            let (l, r) = (compile_expr(l, args)?, compile_expr(r, args)?);
            Box::new(move |a: &[f64]| l(a) - r(a))
        }
        ValueExpr::Mul(l, r) => {
            let (l, r) = (compile_expr(l, args)?, compile_expr(r, args)?);
            Box::new(move |a: &[f64]| l(a) * r(a))
        }
        ValueExpr::Div(l, r) => {
            let (l, r) = (compile_expr(l, args)?, compile_expr(r, args)?);
            Box::new(move |a: &[f64]| l(a) / r(a))
        }
        ValueExpr::Neg(e) => {
            let e = compile_expr(e, args)?;
            Box::new(move |a: &[f64]| -e(a))
        }
        ValueExpr::Floor(e) => {
            let e = compile_expr(e, args)?;
            Box::new(move |a: &[f64]| e(a).floor())
        }
    };
    Ok(value)
}

/// Process-wide cache of compiled vertex insertion methods.
///
/// Entries are keyed by [`MethodSignature`], so the cache holds at most one
/// method per distinct attribute layout among the registered program
/// interfaces.
#[derive(Default)]
pub struct MethodCache {
    methods: Mutex<HashMap<MethodSignature, Arc<VertexAddMethod>>>,
}

impl MethodCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache shared by all buckets.
    pub fn global() -> &'static MethodCache {
        static CACHE: OnceLock<MethodCache> = OnceLock::new();
        CACHE.get_or_init(MethodCache::new)
    }

    /// Fetch the method for `interface`, compiling it on first request.
    pub fn vertex_add_method(
        &self,
        program: &str,
        interface: &ProgramInterface,
    ) -> BucketResult<Arc<VertexAddMethod>> {
        let signature = MethodSignature::of(interface);
        let mut methods = self.methods.lock();
        if let Some(method) = methods.get(&signature) {
            return Ok(Arc::clone(method));
        }

        let method = Arc::new(VertexAddMethod::compile(program, interface)?);
        log::trace!(
            "MethodCache: compiled vertex method for '{}': {}",
            program,
            signature.as_str()
        );
        methods.insert(signature, Arc::clone(&method));
        Ok(method)
    }

    /// Number of distinct methods compiled so far.
    pub fn len(&self) -> usize {
        self.methods.lock().len()
    }

    /// Whether nothing has been compiled yet.
    pub fn is_empty(&self) -> bool {
        self.methods.lock().is_empty()
    }
}

/// Fixed-arity index insertion method.
///
/// Unlike vertex methods this needs no synthesis: every index record is a
/// tuple of `u16` vertex indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementAddMethod {
    components: usize,
}

impl ElementAddMethod {
    /// Bind an insertion method writing `components` indices per record.
    pub fn new(components: usize) -> Self {
        Self { components }
    }

    /// Indices per record.
    pub fn components(&self) -> usize {
        self.components
    }

    /// Append one index tuple and return its record index.
    #[inline]
    pub fn emplace(&self, array: &mut StructArray, indices: &[u16]) -> usize {
        debug_assert_eq!(indices.len(), self.components);
        let (index, record) = array.emplace_back();
        record[..indices.len() * 2].copy_from_slice(bytemuck::cast_slice(indices));
        index
    }
}

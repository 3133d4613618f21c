//! # Schema Registry
//!
//! Ingests module descriptors, indexes their declarations by local name,
//! and exposes closed [`ResolvedType`]s to the binder and validator.
//!
//! ## Lifecycle
//!
//! ```text
//! SchemaRegistry::builder()
//!     .load(core)?          per-module checks: InvalidSchema, SchemaConflict, DuplicateEnum
//!     .load(account)?
//!     ...
//!     .build()?             linking: UnknownType, CyclicInheritance; closes every type
//!         │
//!         ▼
//! SchemaRegistry            immutable; shared read-only across threads
//!         │
//!         ▼
//! RegistryHandle::swap      atomic replacement on reload
//! ```
//!
//! ## Redeclarations
//!
//! Modules redeclare shared types (`Entity`, `Attribute`, `Risk`, ...) so
//! they can be loaded on their own. A redeclaration is the same logical
//! type when its structural fingerprint matches the first declaration.
//! References are normalized to their target local name before
//! fingerprinting, so `.Attribute` in module `account` and `.Attribute` in
//! module `entity` compare equal.
//!
//! ## Concurrency
//!
//! `SchemaRegistry` has no interior mutability. Every type is closed during
//! [`SchemaRegistryBuilder::build`], so [`SchemaRegistry::resolve`] is a
//! map lookup plus an `Arc` clone. Reloads build a complete new registry
//! and publish it through [`RegistryHandle`]; readers holding a snapshot
//! keep a consistent view until they drop it.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;

use igs_core::{
    fingerprint, CanonicalBytes, Fingerprint, PrimitiveKind, QName, SchemaError, TypeId, TypeRef,
    TypeReference,
};

use crate::enums::{EnumCatalog, EnumInfo};
use crate::model::{ClassInfoDecl, EnumInfoDecl, ModuleDescriptor, PropertyInfoDecl, PropertyKindDecl};
use crate::resolver::{ResolvedType, TypeResolver};
use crate::types::{PropertyInfo, PropertyKind, TypeInfo};

// ─── Loaded module summary ───────────────────────────────────────────

/// What the registry remembers about each loaded module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSummary {
    /// Module identifier.
    pub name: String,
    /// Namespace inherited by unqualified element properties.
    pub default_element_namespace_uri: Option<String>,
    /// Local names of every class and enumeration the module declares.
    pub declarations: HashSet<String>,
}

// ─── Builder drafts ──────────────────────────────────────────────────

#[derive(Debug)]
struct PropertyDraft {
    name: String,
    kind: PropertyKind,
    target: TypeReference,
    collection: bool,
    min_occurs: u32,
    required: bool,
    values: Option<Vec<String>>,
    wire_name: QName,
}

#[derive(Debug)]
struct ClassDraft {
    local_name: String,
    module: String,
    redeclared_in: Vec<String>,
    type_name: Option<QName>,
    base: Option<TypeReference>,
    default_ns: Option<String>,
    properties: Vec<PropertyDraft>,
    fingerprint: Fingerprint,
}

#[derive(Debug)]
struct PendingRef {
    module: String,
    referrer: String,
    reference: TypeReference,
}

#[derive(Debug)]
struct ElementDraft {
    name: String,
    module: String,
    reference: TypeReference,
}

/// Normalized class shape used for fingerprinting.
#[derive(Serialize)]
struct ClassShape<'a> {
    base: Option<String>,
    properties: Vec<PropertyShape<'a>>,
}

#[derive(Serialize)]
struct PropertyShape<'a> {
    name: &'a str,
    kind: PropertyKind,
    target: String,
    collection: bool,
    min_occurs: Option<u32>,
    required: bool,
    values: Option<Vec<&'a str>>,
    wire_local: Option<&'a str>,
    wire_namespace: Option<&'a str>,
}

fn normalized_target(reference: &TypeReference) -> String {
    reference
        .target_name()
        .map(str::to_string)
        .unwrap_or_else(|| reference.to_string())
}

fn parse_reference(text: &str, context: &str) -> Result<TypeReference, SchemaError> {
    TypeReference::parse(text).map_err(|reason| SchemaError::InvalidSchema {
        context: context.to_string(),
        reason,
    })
}

fn invalid(context: impl Into<String>, reason: impl Into<String>) -> SchemaError {
    SchemaError::InvalidSchema {
        context: context.into(),
        reason: reason.into(),
    }
}

// ─── Builder ─────────────────────────────────────────────────────────

/// Accumulates modules until [`SchemaRegistryBuilder::build`] links them.
///
/// A failed `load` leaves the builder in an unspecified state; load-time
/// errors abort registry construction, so the builder should be dropped.
#[derive(Debug, Default)]
pub struct SchemaRegistryBuilder {
    modules: Vec<ModuleSummary>,
    classes: Vec<ClassDraft>,
    class_index: HashMap<String, usize>,
    catalog: EnumCatalog,
    refs: Vec<PendingRef>,
    elements: Vec<ElementDraft>,
}

impl SchemaRegistryBuilder {
    /// An empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingest one module's declarations.
    ///
    /// # Errors
    ///
    /// - [`SchemaError::InvalidSchema`] for structural contradictions inside
    ///   the module (duplicate names, declarations named after a primitive,
    ///   collection-valued attributes, ...).
    /// - [`SchemaError::SchemaConflict`] when a class redeclares an existing
    ///   local name with a different shape.
    /// - [`SchemaError::DuplicateEnum`] when an enumeration redeclares an
    ///   existing name with a different value set.
    pub fn load(&mut self, module: ModuleDescriptor) -> Result<&mut Self, SchemaError> {
        if self.modules.iter().any(|m| m.name == module.name) {
            return Err(invalid(
                format!("module {}", module.name),
                "module loaded twice",
            ));
        }

        let mut declarations = HashSet::new();
        for decl in &module.type_infos {
            if decl.local_name().parse::<PrimitiveKind>().is_ok() {
                return Err(invalid(
                    format!("module {}", module.name),
                    format!("'{}' is a primitive type name", decl.local_name()),
                ));
            }
            if !declarations.insert(decl.local_name().to_string()) {
                return Err(invalid(
                    format!("module {}", module.name),
                    format!("'{}' declared more than once", decl.local_name()),
                ));
            }
        }

        let mut enum_count = 0usize;
        for decl in module.enums() {
            let info = enum_info(&module.name, decl)?;
            if let Some(&idx) = self.class_index.get(&info.local_name) {
                return Err(SchemaError::SchemaConflict {
                    type_name: info.local_name,
                    existing_module: self.classes[idx].module.clone(),
                    incoming_module: module.name.clone(),
                });
            }
            self.catalog.register(info)?;
            enum_count += 1;
        }

        let mut class_count = 0usize;
        for decl in module.classes() {
            let draft = class_draft(&module, decl)?;
            self.merge_class(draft)?;
            class_count += 1;
        }

        for decl in &module.element_infos {
            let context = format!("element {} in module {}", decl.element_name(), module.name);
            self.elements.push(ElementDraft {
                name: decl.element_name().to_string(),
                module: module.name.clone(),
                reference: parse_reference(&decl.type_reference(), &context)?,
            });
        }

        tracing::info!(
            module = %module.name,
            classes = class_count,
            enums = enum_count,
            elements = module.element_infos.len(),
            "schema module loaded"
        );

        self.modules.push(ModuleSummary {
            name: module.name,
            default_element_namespace_uri: module.default_element_namespace_uri,
            declarations,
        });
        Ok(self)
    }

    fn merge_class(&mut self, draft: ClassDraft) -> Result<(), SchemaError> {
        if let Some(existing) = self.catalog.get(&draft.local_name) {
            return Err(SchemaError::SchemaConflict {
                type_name: draft.local_name,
                existing_module: existing.module.clone().unwrap_or_default(),
                incoming_module: draft.module,
            });
        }

        if let Some(base) = &draft.base {
            self.refs.push(PendingRef {
                module: draft.module.clone(),
                referrer: draft.local_name.clone(),
                reference: base.clone(),
            });
        }
        for p in &draft.properties {
            if !matches!(p.target, TypeReference::Primitive(_)) {
                self.refs.push(PendingRef {
                    module: draft.module.clone(),
                    referrer: format!("{}.{}", draft.local_name, p.name),
                    reference: p.target.clone(),
                });
            }
        }

        match self.class_index.get(&draft.local_name) {
            Some(&idx) => {
                let existing = &mut self.classes[idx];
                if existing.fingerprint != draft.fingerprint {
                    return Err(SchemaError::SchemaConflict {
                        type_name: draft.local_name,
                        existing_module: existing.module.clone(),
                        incoming_module: draft.module,
                    });
                }
                tracing::debug!(
                    type_name = %draft.local_name,
                    module = %draft.module,
                    first_declared_in = %existing.module,
                    fingerprint = %draft.fingerprint.short(),
                    "identical type redeclared; reusing existing declaration"
                );
                existing.redeclared_in.push(draft.module);
            }
            None => {
                self.class_index
                    .insert(draft.local_name.clone(), self.classes.len());
                self.classes.push(draft);
            }
        }
        Ok(())
    }

    fn module_declares(&self, module: &str, name: &str) -> bool {
        self.modules
            .iter()
            .find(|m| m.name == module)
            .is_some_and(|m| m.declarations.contains(name))
    }

    fn global(&self, name: &str) -> Option<TypeRef> {
        self.class_index
            .get(name)
            .map(|idx| TypeRef::Class(TypeId(*idx as u32)))
            .or_else(|| self.catalog.id_of(name).map(TypeRef::Enum))
    }

    /// Link a reference written in `module`.
    fn link(&self, module: &str, reference: &TypeReference) -> Option<TypeRef> {
        match reference {
            TypeReference::Primitive(kind) => Some(TypeRef::Primitive(*kind)),
            TypeReference::Relative(name) => {
                if self.module_declares(module, name) {
                    self.global(name)
                } else {
                    None
                }
            }
            TypeReference::Qualified { module: m, name } => {
                if self.module_declares(m, name) {
                    self.global(name)
                } else {
                    None
                }
            }
            TypeReference::Global(name) => self.global(name),
        }
    }

    fn link_or_unknown(
        &self,
        module: &str,
        reference: &TypeReference,
        referrer: &str,
    ) -> Result<TypeRef, SchemaError> {
        self.link(module, reference)
            .ok_or_else(|| SchemaError::UnknownType {
                reference: reference.to_string(),
                referrer: referrer.to_string(),
            })
    }

    /// Link every reference, close every type and freeze the registry.
    ///
    /// # Errors
    ///
    /// - [`SchemaError::UnknownType`] for a reference to an undeclared name.
    /// - [`SchemaError::CyclicInheritance`] for a `baseTypeInfo` loop.
    /// - [`SchemaError::InvalidSchema`] when a reference points at the wrong
    ///   kind of declaration (an enumeration as a base type, a class as an
    ///   attribute value, ...).
    /// - [`SchemaError::SchemaConflict`] when two modules bind the same
    ///   element name to different types.
    pub fn build(self) -> Result<SchemaRegistry, SchemaError> {
        for r in &self.refs {
            self.link_or_unknown(&r.module, &r.reference, &r.referrer)?;
        }

        let mut types = Vec::with_capacity(self.classes.len());
        for (idx, draft) in self.classes.iter().enumerate() {
            types.push(self.link_class(TypeId(idx as u32), draft)?);
        }

        let resolved = {
            let resolver = TypeResolver::new(&types, &self.catalog);
            let mut resolved = Vec::with_capacity(types.len());
            for t in &types {
                resolved.push(Arc::new(resolver.close(t)?));
            }
            resolved
        };

        let mut elements: BTreeMap<String, (TypeId, String)> = BTreeMap::new();
        for el in &self.elements {
            let referrer = format!("element {}", el.name);
            let id = match self.link_or_unknown(&el.module, &el.reference, &referrer)? {
                TypeRef::Class(id) => id,
                other => {
                    return Err(invalid(
                        referrer,
                        format!("element must bind a class, found {other:?}"),
                    ))
                }
            };
            if let Some((prev, prev_module)) = elements.get(&el.name) {
                if *prev != id {
                    return Err(SchemaError::SchemaConflict {
                        type_name: el.name.clone(),
                        existing_module: prev_module.clone(),
                        incoming_module: el.module.clone(),
                    });
                }
                continue;
            }
            elements.insert(el.name.clone(), (id, el.module.clone()));
        }

        let by_name = types
            .iter()
            .map(|t| (t.local_name.clone(), t.id))
            .collect();

        tracing::info!(
            modules = self.modules.len(),
            types = types.len(),
            enums = self.catalog.len(),
            elements = elements.len(),
            "schema registry built"
        );

        Ok(SchemaRegistry {
            modules: self.modules,
            types,
            by_name,
            resolved,
            enums: self.catalog,
            elements: elements.into_iter().map(|(k, (id, _))| (k, id)).collect(),
        })
    }

    fn link_class(&self, id: TypeId, draft: &ClassDraft) -> Result<TypeInfo, SchemaError> {
        let base = match &draft.base {
            None => None,
            Some(reference) => {
                match self.link_or_unknown(&draft.module, reference, &draft.local_name)? {
                    TypeRef::Class(base) => Some(base),
                    _ => {
                        return Err(invalid(
                            format!("type {}", draft.local_name),
                            format!("baseTypeInfo '{reference}' is not a class"),
                        ))
                    }
                }
            }
        };

        let mut properties = Vec::with_capacity(draft.properties.len());
        for p in &draft.properties {
            let context = format!("property {}.{}", draft.local_name, p.name);
            let type_ref = self.link_or_unknown(&draft.module, &p.target, &context)?;

            if p.kind == PropertyKind::Attribute && matches!(type_ref, TypeRef::Class(_)) {
                return Err(invalid(
                    context,
                    format!("attribute cannot hold structured type '{}'", p.target),
                ));
            }

            let values = match (&p.values, type_ref) {
                (None, _) => None,
                (Some(values), TypeRef::Primitive(kind)) if kind.is_textual() => Some(Arc::new(
                    EnumInfo::inline(&draft.local_name, &p.name, kind, values.clone()),
                )),
                (Some(_), _) => {
                    return Err(invalid(
                        context,
                        format!(
                            "inline values require a textual primitive typeInfo, found '{}'",
                            p.target
                        ),
                    ))
                }
            };

            properties.push(PropertyInfo {
                name: p.name.clone(),
                kind: p.kind,
                wire_name: p.wire_name.clone(),
                type_ref,
                collection: p.collection,
                min_occurs: p.min_occurs,
                required: p.required,
                values,
            });
        }

        Ok(TypeInfo {
            id,
            local_name: draft.local_name.clone(),
            type_name: draft.type_name.clone(),
            base,
            module: draft.module.clone(),
            redeclared_in: draft.redeclared_in.clone(),
            default_element_namespace_uri: draft.default_ns.clone(),
            properties,
            fingerprint: draft.fingerprint,
        })
    }
}

fn enum_info(module: &str, decl: &EnumInfoDecl) -> Result<EnumInfo, SchemaError> {
    let context = format!("enumeration {}.{}", module, decl.local_name);
    let base = match parse_reference(&decl.base_type_info, &context)? {
        TypeReference::Primitive(kind) if is_enum_base(kind) => kind,
        other => {
            return Err(invalid(
                context,
                format!("baseTypeInfo '{other}' is not a textual primitive"),
            ))
        }
    };
    check_values(&context, &decl.values)?;
    Ok(EnumInfo::named(
        module,
        decl.local_name.clone(),
        base,
        decl.values.clone(),
    ))
}

fn check_values(context: &str, values: &[String]) -> Result<(), SchemaError> {
    if values.is_empty() {
        return Err(invalid(context, "enumeration has no values"));
    }
    let mut seen = HashSet::new();
    for v in values {
        if !seen.insert(v.as_str()) {
            return Err(invalid(context, format!("value '{v}' listed more than once")));
        }
    }
    Ok(())
}

fn class_draft(module: &ModuleDescriptor, decl: &ClassInfoDecl) -> Result<ClassDraft, SchemaError> {
    let context = format!("type {}.{}", module.name, decl.local_name);
    let default_ns = decl
        .default_element_namespace_uri
        .clone()
        .or_else(|| module.default_element_namespace_uri.clone());

    let base = decl
        .base_type_info
        .as_deref()
        .map(|b| parse_reference(b, &context))
        .transpose()?;

    let mut names = HashSet::new();
    let mut properties = Vec::with_capacity(decl.property_infos.len());
    for p in &decl.property_infos {
        if !names.insert(p.name.as_str()) {
            return Err(invalid(
                &context,
                format!("property '{}' declared more than once", p.name),
            ));
        }
        properties.push(property_draft(&context, default_ns.as_deref(), p)?);
    }

    let fingerprint = class_fingerprint(&context, base.as_ref(), &decl.property_infos, &properties)?;

    Ok(ClassDraft {
        local_name: decl.local_name.clone(),
        module: module.name.clone(),
        redeclared_in: Vec::new(),
        type_name: decl
            .type_name
            .as_ref()
            .map(|n| n.to_qname(default_ns.as_deref())),
        base,
        default_ns,
        properties,
        fingerprint,
    })
}

fn property_draft(
    type_context: &str,
    default_ns: Option<&str>,
    p: &PropertyInfoDecl,
) -> Result<PropertyDraft, SchemaError> {
    let context = format!("{type_context} property {}", p.name);
    let target = parse_reference(p.type_info_or_default(), &context)?;

    let (kind, wire_name, min_occurs) = match p.kind {
        PropertyKindDecl::Attribute => {
            if p.collection {
                return Err(invalid(context, "attribute-typed property cannot be a collection"));
            }
            if p.min_occurs.is_some() {
                return Err(invalid(context, "attributes use 'required', not 'minOccurs'"));
            }
            if p.element_name.is_some() {
                return Err(invalid(context, "attribute declares an elementName"));
            }
            let wire = p
                .attribute_name
                .as_ref()
                .map(|n| n.to_qname(None))
                .unwrap_or_else(|| QName::local(p.name.clone()));
            (PropertyKind::Attribute, wire, 0)
        }
        PropertyKindDecl::Element => {
            if p.required {
                return Err(invalid(context, "elements use 'minOccurs', not 'required'"));
            }
            if p.attribute_name.is_some() {
                return Err(invalid(context, "element declares an attributeName"));
            }
            let min_occurs = p.min_occurs.unwrap_or(1);
            if min_occurs > 1 {
                return Err(invalid(context, format!("minOccurs {min_occurs} is not 0 or 1")));
            }
            let wire = p
                .element_name
                .as_ref()
                .map(|n| n.to_qname(default_ns))
                .unwrap_or_else(|| QName {
                    namespace_uri: default_ns.map(str::to_string),
                    local_part: p.name.clone(),
                });
            (PropertyKind::Element, wire, min_occurs)
        }
    };

    if let Some(values) = &p.values {
        check_values(&context, values)?;
    }

    Ok(PropertyDraft {
        name: p.name.clone(),
        kind,
        target,
        collection: p.collection,
        min_occurs,
        required: p.required,
        values: p.values.clone(),
        wire_name,
    })
}

fn class_fingerprint(
    context: &str,
    base: Option<&TypeReference>,
    decls: &[PropertyInfoDecl],
    drafts: &[PropertyDraft],
) -> Result<Fingerprint, SchemaError> {
    let properties = decls
        .iter()
        .zip(drafts)
        .map(|(decl, draft)| {
            let explicit = match draft.kind {
                PropertyKind::Attribute => decl.attribute_name.as_ref(),
                PropertyKind::Element => decl.element_name.as_ref(),
            };
            PropertyShape {
                name: &draft.name,
                kind: draft.kind,
                target: normalized_target(&draft.target),
                collection: draft.collection,
                min_occurs: (draft.kind == PropertyKind::Element).then_some(draft.min_occurs),
                required: draft.required,
                values: draft.values.as_ref().map(|v| {
                    let mut sorted: Vec<&str> = v.iter().map(String::as_str).collect();
                    sorted.sort_unstable();
                    sorted
                }),
                wire_local: explicit.map(|n| n.local_part()),
                wire_namespace: explicit.and_then(|n| n.namespace_uri()),
            }
        })
        .collect();

    let shape = ClassShape {
        base: base.map(normalized_target),
        properties,
    };
    let bytes = CanonicalBytes::new(&shape).map_err(|e| invalid(context, e.to_string()))?;
    Ok(fingerprint(&bytes))
}

// ─── Registry ────────────────────────────────────────────────────────

/// The immutable, fully linked schema.
#[derive(Debug)]
pub struct SchemaRegistry {
    modules: Vec<ModuleSummary>,
    types: Vec<TypeInfo>,
    by_name: HashMap<String, TypeId>,
    resolved: Vec<Arc<ResolvedType>>,
    enums: EnumCatalog,
    elements: BTreeMap<String, TypeId>,
}

impl SchemaRegistry {
    /// Start building a registry.
    pub fn builder() -> SchemaRegistryBuilder {
        SchemaRegistryBuilder::new()
    }

    /// Load every module in order and build.
    ///
    /// # Errors
    ///
    /// The first load-time or link-time error encountered.
    pub fn from_modules(
        modules: impl IntoIterator<Item = ModuleDescriptor>,
    ) -> Result<Self, SchemaError> {
        let mut builder = Self::builder();
        for module in modules {
            builder.load(module)?;
        }
        builder.build()
    }

    /// Find a declaration by `LocalName` or `module.LocalName`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnknownType`] if no such class exists.
    pub fn lookup(&self, name: &str) -> Result<&TypeInfo, SchemaError> {
        self.id_of(name)
            .map(|id| &self.types[id.index()])
            .ok_or_else(|| SchemaError::UnknownType {
                reference: name.to_string(),
                referrer: "lookup".to_string(),
            })
    }

    /// The closed projection of a declaration.
    ///
    /// Repeated calls return the same cached value until the registry is
    /// replaced.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnknownType`] if no such class exists.
    pub fn resolve(&self, name: &str) -> Result<Arc<ResolvedType>, SchemaError> {
        self.id_of(name)
            .map(|id| Arc::clone(&self.resolved[id.index()]))
            .ok_or_else(|| SchemaError::UnknownType {
                reference: name.to_string(),
                referrer: "resolve".to_string(),
            })
    }

    /// The closed type bound to a top-level element.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnknownType`] if no module binds the element.
    pub fn resolve_element(&self, element: &str) -> Result<Arc<ResolvedType>, SchemaError> {
        self.elements
            .get(element)
            .map(|id| Arc::clone(&self.resolved[id.index()]))
            .ok_or_else(|| SchemaError::UnknownType {
                reference: element.to_string(),
                referrer: "element".to_string(),
            })
    }

    /// The closed projection of a class by arena id.
    pub fn resolved(&self, id: TypeId) -> Option<&Arc<ResolvedType>> {
        self.resolved.get(id.index())
    }

    /// A linked declaration by arena id.
    pub fn type_info(&self, id: TypeId) -> Option<&TypeInfo> {
        self.types.get(id.index())
    }

    /// The enumeration catalog.
    pub fn enums(&self) -> &EnumCatalog {
        &self.enums
    }

    /// Every loaded module, in load order.
    pub fn modules(&self) -> &[ModuleSummary] {
        &self.modules
    }

    /// Names of every loaded module, in load order.
    pub fn module_names(&self) -> Vec<&str> {
        self.modules.iter().map(|m| m.name.as_str()).collect()
    }

    /// Local names of every class, sorted alphabetically.
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.by_name.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Top-level element names, sorted alphabetically.
    pub fn element_names(&self) -> Vec<&str> {
        self.elements.keys().map(String::as_str).collect()
    }

    /// Number of classes.
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    fn id_of(&self, name: &str) -> Option<TypeId> {
        match TypeReference::parse(name).ok()? {
            TypeReference::Global(local) => self.by_name.get(&local).copied(),
            TypeReference::Qualified { module, name } => {
                let declared = self
                    .modules
                    .iter()
                    .find(|m| m.name == module)
                    .is_some_and(|m| m.declarations.contains(&name));
                if declared {
                    self.by_name.get(&name).copied()
                } else {
                    None
                }
            }
            TypeReference::Relative(_) | TypeReference::Primitive(_) => None,
        }
    }
}

// ─── Handle ──────────────────────────────────────────────────────────

/// Publishes the current registry and swaps it atomically on reload.
///
/// Readers call [`RegistryHandle::snapshot`] once per unit of work and use
/// the returned `Arc` for the whole of it.
#[derive(Debug)]
pub struct RegistryHandle {
    current: RwLock<Arc<SchemaRegistry>>,
    generation: AtomicU64,
}

impl RegistryHandle {
    /// Publish an initial registry.
    pub fn new(registry: SchemaRegistry) -> Self {
        Self {
            current: RwLock::new(Arc::new(registry)),
            generation: AtomicU64::new(0),
        }
    }

    /// The registry currently published.
    pub fn snapshot(&self) -> Arc<SchemaRegistry> {
        Arc::clone(&self.current.read())
    }

    /// Number of swaps performed since construction.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Publish `next`, returning the registry it replaced.
    pub fn swap(&self, next: SchemaRegistry) -> Arc<SchemaRegistry> {
        let next = Arc::new(next);
        let previous = std::mem::replace(&mut *self.current.write(), Arc::clone(&next));
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::info!(
            generation,
            types = next.type_count(),
            "schema registry swapped"
        );
        previous
    }

    /// Build a complete registry from `modules` and publish it.
    ///
    /// # Errors
    ///
    /// Any load-time error; the current registry stays published.
    pub fn reload(
        &self,
        modules: impl IntoIterator<Item = ModuleDescriptor>,
    ) -> Result<Arc<SchemaRegistry>, SchemaError> {
        match SchemaRegistry::from_modules(modules) {
            Ok(next) => {
                self.swap(next);
                Ok(self.snapshot())
            }
            Err(e) => {
                tracing::warn!(error = %e, "schema reload rejected; keeping current registry");
                Err(e)
            }
        }
    }
}

/// Is `kind` usable as an enumeration base?
pub(crate) fn is_enum_base(kind: PrimitiveKind) -> bool {
    kind.is_textual()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(yaml: &str) -> ModuleDescriptor {
        serde_yaml::from_str(yaml).unwrap()
    }

    const ENTITY: &str = r#"
name: entity
typeInfos:
  - localName: Attribute
    propertyInfos:
      - name: name
        type: attribute
        required: true
  - localName: Entity
    propertyInfos:
      - name: id
        type: attribute
        typeInfo: Token
        required: true
      - name: attributes
        collection: true
        minOccurs: 0
        typeInfo: .Attribute
"#;

    #[test]
    fn test_relative_references_link_within_module() {
        let reg = SchemaRegistry::from_modules([module(ENTITY)]).unwrap();
        let entity = reg.lookup("Entity").unwrap();
        assert_eq!(entity.properties[1].type_ref, TypeRef::Class(reg.lookup("Attribute").unwrap().id));
    }

    #[test]
    fn test_qualified_lookup_requires_declaring_module() {
        let reg = SchemaRegistry::from_modules([module(ENTITY)]).unwrap();
        assert!(reg.lookup("entity.Entity").is_ok());
        assert!(matches!(
            reg.lookup("core.Entity"),
            Err(SchemaError::UnknownType { .. })
        ));
        assert!(reg.lookup(".Entity").is_err());
    }

    #[test]
    fn test_module_loaded_twice_is_invalid() {
        let mut b = SchemaRegistry::builder();
        b.load(module(ENTITY)).unwrap();
        assert!(matches!(
            b.load(module(ENTITY)),
            Err(SchemaError::InvalidSchema { .. })
        ));
    }

    #[test]
    fn test_primitive_names_cannot_be_declared() {
        for (kind, name) in [("", "Token"), ("type: enumInfo\n    values: [a]\n    ", "String")] {
            let yaml = format!("name: m\ntypeInfos:\n  - {kind}localName: {name}\n");
            let err = SchemaRegistry::builder().load(module(&yaml)).map(|_| ()).unwrap_err();
            assert_eq!(
                err,
                SchemaError::InvalidSchema {
                    context: "module m".into(),
                    reason: format!("'{name}' is a primitive type name"),
                }
            );
        }
    }

    #[test]
    fn test_relative_reference_to_other_module_is_unknown() {
        let other = r#"
name: other
typeInfos:
  - localName: Holder
    propertyInfos:
      - name: entity
        typeInfo: .Entity
"#;
        let err = SchemaRegistry::from_modules([module(ENTITY), module(other)]).unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnknownType {
                reference: ".Entity".into(),
                referrer: "Holder.entity".into()
            }
        );
    }

    #[test]
    fn test_class_and_enum_cannot_share_a_name() {
        let clash = r#"
name: clash
typeInfos:
  - type: enumInfo
    localName: Entity
    values: [a]
"#;
        let err = SchemaRegistry::from_modules([module(ENTITY), module(clash)]).unwrap_err();
        assert!(matches!(err, SchemaError::SchemaConflict { .. }));
    }

    #[test]
    fn test_enum_as_base_type_is_invalid() {
        let yaml = r#"
name: m
typeInfos:
  - type: enumInfo
    localName: Risk
    values: [low]
  - localName: T
    baseTypeInfo: .Risk
"#;
        assert!(matches!(
            SchemaRegistry::from_modules([module(yaml)]),
            Err(SchemaError::InvalidSchema { .. })
        ));
    }

    #[test]
    fn test_inline_values_on_boolean_are_invalid() {
        let yaml = r#"
name: m
typeInfos:
  - localName: T
    propertyInfos:
      - name: flag
        type: attribute
        typeInfo: Boolean
        values: ["true"]
"#;
        assert!(matches!(
            SchemaRegistry::from_modules([module(yaml)]),
            Err(SchemaError::InvalidSchema { .. })
        ));
    }

    #[test]
    fn test_element_namespace_is_inherited() {
        let yaml = r#"
name: m
defaultElementNamespaceURI: urn:m
typeInfos:
  - localName: T
    propertyInfos:
      - name: a
        minOccurs: 0
      - name: b
        minOccurs: 0
        elementName:
          localPart: bee
          namespaceURI: urn:other
      - name: c
        type: attribute
"#;
        let reg = SchemaRegistry::from_modules([module(yaml)]).unwrap();
        let t = reg.resolve("T").unwrap();
        assert_eq!(t.property("a").unwrap().wire_name, QName::qualified("urn:m", "a"));
        assert_eq!(t.property("b").unwrap().wire_name, QName::qualified("urn:other", "bee"));
        assert_eq!(t.property("c").unwrap().wire_name, QName::local("c"));
    }

    #[test]
    fn test_elements_bind_to_types() {
        let yaml = r#"
name: m
typeInfos:
  - localName: T
elementInfos:
  - elementName: t
    typeInfo: .T
"#;
        let reg = SchemaRegistry::from_modules([module(yaml)]).unwrap();
        assert_eq!(reg.resolve_element("t").unwrap().local_name, "T");
        assert_eq!(reg.element_names(), vec!["t"]);
        assert!(reg.resolve_element("x").is_err());
    }

    #[test]
    fn test_enum_base_must_be_textual() {
        assert!(is_enum_base(PrimitiveKind::Token));
        assert!(!is_enum_base(PrimitiveKind::Boolean));
    }
}

use std::{
    any::Any,
    collections::{BTreeMap, HashMap, HashSet},
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

use either::Either;
use goconst::ConstSet;
use log::{debug, error, trace, warn};
use num_traits::ToPrimitive;
use parking_lot::RwLock;

use crate::{
    base::{
        cleanup::CleanupStack,
        function::{Body, BoundMethod, Function, FunctionRef},
        meta::GoConfig,
        methods::MethodTable,
        module::{Declaration, ModuleContext, ModuleDecl, Symbol},
        object::Object,
        record::{FieldType, Initializer, Record, RecordType, RecordTypeRef},
    },
    utils::{
        error::{GoError, GoResult},
        ref_id::ArcId,
    },
};

pub mod cleanup;
pub mod function;
pub mod meta;
pub mod methods;
pub mod module;
pub mod object;
pub mod record;

type PanicPayload = Box<dyn Any + Send>;

/// Outcome of [`GoContext::activate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// A module with the same name was activated earlier; nothing was done.
    AlreadyActive,
    Loaded,
    /// The module was the entry module and its entry function returned this
    /// exit status.
    Exited(i32),
}

impl Activation {
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Activation::Exited(code) => Some(*code),
            _ => None,
        }
    }

    /// Terminates the process with the entry function's exit status. Does
    /// nothing if no entry function ran.
    pub fn exit_process(self) {
        if let Activation::Exited(code) = self {
            debug!("Exiting with status {}", code);
            std::process::exit(code);
        }
    }
}

/// Shared state of every module activated together.
///
/// Holds the merged scope of all activated modules, the method table with its
/// de-duplication set and the stack of cleanup scopes of the calls currently
/// running.
#[derive(Debug)]
pub struct GoContext {
    config: GoConfig,
    scope: HashMap<String, Symbol>,
    methods: MethodTable,
    cleanup: CleanupStack,
    modules: Vec<ModuleContext>,
    active: HashSet<String>,
}

impl Default for GoContext {
    fn default() -> Self {
        Self::new(GoConfig::default())
    }
}

impl GoContext {
    pub fn new(config: GoConfig) -> Self {
        Self {
            config,
            scope: HashMap::new(),
            methods: MethodTable::default(),
            cleanup: CleanupStack::default(),
            modules: Vec::new(),
            active: HashSet::new(),
        }
    }

    /// Creates a context configured from [`GoConfig::load_or_default`].
    pub fn from_default_config() -> GoResult<Self> {
        Ok(Self::new(GoConfig::load_or_default()?))
    }

    pub fn config(&self) -> &GoConfig {
        &self.config
    }

    pub fn methods(&self) -> &MethodTable {
        &self.methods
    }

    /// Modules activated so far, in activation order.
    pub fn modules(&self) -> &[ModuleContext] {
        &self.modules
    }

    pub fn module(&self, name: &str) -> Option<&ModuleContext> {
        self.modules.iter().find(|module| module.name == name)
    }

    pub fn is_active(&self, name: &str) -> bool {
        self.active.contains(name)
    }

    /// Activates a module.
    ///
    /// The declarations are merged into the scope in order, then every record
    /// type declared by the module receives its initializer, receiver
    /// functions are attached as methods and every declared function is
    /// replaced by a wrapper running it inside its own cleanup scope. If the
    /// module is the configured entry module, its entry function is then
    /// called and its result converted into an exit status.
    ///
    /// Activating a module name a second time does nothing. If any step before
    /// the entry function fails, the context is left as it was.
    pub fn activate(&mut self, module: ModuleDecl) -> GoResult<Activation> {
        if self.active.contains(module.name()) {
            debug!("Module `{}` is already active", module.name());
            return Ok(Activation::AlreadyActive);
        }

        debug!(
            "Activating module `{}` ({} declarations)",
            module.name(),
            module.items().len()
        );
        let scope = self.scope.clone();
        let methods = self.methods.clone();
        let (context, entry) = match self.stage(&module) {
            Ok(staged) => staged,
            Err(err) => {
                debug!("Rolling back activation of `{}`: {}", module.name(), err);
                self.scope = scope;
                self.methods = methods;
                return Err(err);
            }
        };

        self.active.insert(module.name().to_string());
        self.modules.push(context);

        let Some(entry) = entry else {
            return Ok(Activation::Loaded);
        };

        debug!("Running entry function `{}`", entry.name());
        let status = self.call(&entry, &[])?;
        Ok(Activation::Exited(exit_status(&status)))
    }

    /// Runs every activation pass of `module` and resolves its entry function
    /// if it is the entry module.
    fn stage(&mut self, module: &ModuleDecl) -> GoResult<(ModuleContext, Option<FunctionRef>)> {
        let mut context = ModuleContext::new(module.name());
        self.load(module, &mut context);

        for ty in &context.records {
            ty.install_initializer(Initializer::synthesize(ty));
            trace!("Synthesized initializer of `{}`", ty.name());
        }

        self.attach_methods(&context.functions)?;
        self.wrap_functions(&mut context);

        if module.name() != self.config.entry_module {
            return Ok((context, None));
        }

        let entry = self.function(&self.config.entry_function)?;
        Ok((context, Some(entry)))
    }

    /// Merges the declarations of `module` into the scope.
    fn load(&mut self, module: &ModuleDecl, context: &mut ModuleContext) {
        for item in module.items() {
            trace!("Binding `{}` from `{}`", item.name(), module.name());
            match item {
                Declaration::Record { name, fields } => {
                    let ty = Arc::new(RecordType::new(name.clone(), fields.iter().cloned()));
                    context.records.push(Arc::clone(&ty));
                    self.scope.insert(name.clone(), Symbol::Record(ty));
                }
                Declaration::Function(function) => {
                    // Attach what is already declared before a receiver function
                    // can shadow a same-named one.
                    if function.receiver().is_some() {
                        self.discover_eager(&context.functions);
                    }

                    context.functions.push(FunctionRef::clone(function));
                    self.scope.insert(
                        function.name().to_string(),
                        Symbol::Function(FunctionRef::clone(function)),
                    );
                }
                Declaration::Consts(consts) => {
                    context.consts.push(consts.name().to_string());
                    self.scope.insert(
                        consts.name().to_string(),
                        Symbol::Consts(Arc::new(consts.clone())),
                    );
                }
                Declaration::Value { name, value } => {
                    self.scope.insert(name.clone(), Symbol::Value(value.clone()));
                }
                Declaration::Imported { name, symbol } => {
                    self.scope.insert(name.clone(), symbol.clone());
                }
            }
        }
    }

    /// Attaches every receiver function of `functions` to the record type its
    /// receiver names. Functions attached earlier are skipped.
    ///
    /// Returns the number of functions newly attached, or
    /// [`GoError::UndefinedReceiver`] if a receiver does not name a record type
    /// in scope.
    pub fn attach_methods(&mut self, functions: &[FunctionRef]) -> GoResult<usize> {
        let mut attached = 0;
        for function in functions {
            let Some(receiver) = function.receiver() else {
                continue;
            };
            let ty = self
                .receiver_type(receiver)
                .ok_or_else(|| GoError::UndefinedReceiver {
                    function: function.name().to_string(),
                    receiver: receiver.to_string(),
                })?;
            attached += usize::from(self.attach(&ty, function));
        }

        Ok(attached)
    }

    /// Like [`GoContext::attach_methods`], but skips receivers that do not
    /// resolve yet.
    fn discover_eager(&mut self, functions: &[FunctionRef]) -> usize {
        let mut attached = 0;
        for function in functions {
            if let Some(ty) = function.receiver().and_then(|name| self.receiver_type(name)) {
                attached += usize::from(self.attach(&ty, function));
            }
        }
        attached
    }

    fn receiver_type(&self, name: &str) -> Option<RecordTypeRef> {
        self.scope
            .get(name)
            .and_then(Symbol::as_record)
            .map(RecordTypeRef::clone)
    }

    fn attach(&mut self, ty: &RecordTypeRef, function: &FunctionRef) -> bool {
        !self.methods.is_attached(function)
            && self
                .methods
                .attach(ty, function, &self.config.stringer_method)
    }

    /// Replaces every function declared by the module with a scoped wrapper,
    /// in the scope and in the method table.
    fn wrap_functions(&mut self, context: &mut ModuleContext) {
        for slot in context.functions.iter_mut() {
            if slot.is_scoped() {
                continue;
            }

            let wrapper = Function::scoped(slot);
            if let Some(Symbol::Function(bound)) = self.scope.get_mut(wrapper.name()) {
                if FunctionRef::ptr_eq(bound, slot) {
                    *bound = FunctionRef::clone(&wrapper);
                }
            }

            let methods = self.methods.replace(slot, &wrapper);
            trace!(
                "Wrapped `{}` for scoped cleanup ({} method entries)",
                wrapper.name(),
                methods
            );
            *slot = wrapper;
        }
    }

    pub fn lookup(&self, name: &str) -> GoResult<&Symbol> {
        self.scope
            .get(name)
            .ok_or_else(|| GoError::UndefinedName(name.to_string()))
    }

    fn wrong_kind(name: &str, expected: &'static str, found: &Symbol) -> GoError {
        GoError::WrongKind {
            name: name.to_string(),
            expected,
            found: found.kind(),
        }
    }

    pub fn function(&self, name: &str) -> GoResult<FunctionRef> {
        match self.lookup(name)? {
            Symbol::Function(function) => Ok(FunctionRef::clone(function)),
            other => Err(Self::wrong_kind(name, "function", other)),
        }
    }

    pub fn record_type(&self, name: &str) -> GoResult<RecordTypeRef> {
        match self.lookup(name)? {
            Symbol::Record(ty) => Ok(RecordTypeRef::clone(ty)),
            other => Err(Self::wrong_kind(name, "record type", other)),
        }
    }

    pub fn consts(&self, name: &str) -> GoResult<Arc<ConstSet>> {
        match self.lookup(name)? {
            Symbol::Consts(consts) => Ok(Arc::clone(consts)),
            other => Err(Self::wrong_kind(name, "constant group", other)),
        }
    }

    /// Reads `member` of the constant group `group`.
    pub fn constant(&self, group: &str, member: &str) -> GoResult<goconst::Value> {
        let consts = self.consts(group)?;
        consts.get(member).cloned().ok_or_else(|| {
            goconst::Error::UndefinedMember {
                group: group.to_string(),
                name: member.to_string(),
            }
            .into()
        })
    }

    pub fn value(&self, name: &str) -> GoResult<Object> {
        match self.lookup(name)? {
            Symbol::Value(value) => Ok(value.clone()),
            other => Err(Self::wrong_kind(name, "value", other)),
        }
    }

    /// Constructs an instance of the record type bound to `name` through its
    /// synthesized initializer.
    pub fn construct<K, V>(
        &self,
        name: &str,
        kwargs: impl IntoIterator<Item = (K, V)>,
    ) -> GoResult<Object>
    where
        K: Into<String>,
        V: Into<Object>,
    {
        let ty = self.record_type(name)?;
        self.instantiate(&ty, kwargs)
    }

    /// Constructs an instance of `ty`. Fields that are omitted or given
    /// [`Object::Nil`] get the default value of their declared type.
    pub fn instantiate<K, V>(
        &self,
        ty: &RecordTypeRef,
        kwargs: impl IntoIterator<Item = (K, V)>,
    ) -> GoResult<Object>
    where
        K: Into<String>,
        V: Into<Object>,
    {
        let kwargs = kwargs
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        self.build(ty, kwargs, &mut Vec::new())
    }

    fn build(
        &self,
        ty: &RecordTypeRef,
        mut kwargs: BTreeMap<String, Object>,
        building: &mut Vec<ArcId<RecordType>>,
    ) -> GoResult<Object> {
        let initializer = ty
            .initializer()
            .ok_or_else(|| GoError::NoInitializer(ty.name().to_string()))?;

        if let Some(field) = kwargs.keys().find(|key| !initializer.accepts(key)) {
            return Err(GoError::UnexpectedField {
                ty: ty.name().to_string(),
                field: field.clone(),
            });
        }

        building.push(ArcId::new(ty));
        let mut values = BTreeMap::new();
        for param in initializer.params() {
            let value = match kwargs.remove(&param.name) {
                Some(value) if !value.is_nil() => value,
                _ => self.default_value(&param.ty, building)?,
            };
            values.insert(param.name.clone(), value);
        }
        building.pop();

        let record = Record::new(RecordTypeRef::clone(ty), values);
        Ok(Object::Record(Arc::new(RwLock::new(record))))
    }

    fn default_value(
        &self,
        ty: &FieldType,
        building: &mut Vec<ArcId<RecordType>>,
    ) -> GoResult<Object> {
        match ty {
            FieldType::Record(name) => {
                let nested = self.record_type(name)?;
                if building.contains(&ArcId::new(&nested)) {
                    return Err(GoError::RecursiveDefault(name.clone()));
                }
                self.build(&nested, BTreeMap::new(), building)
            }
            builtin => Ok(builtin.zero().unwrap_or_default()),
        }
    }

    /// Calls `function` with `args`. Methods take their receiver first.
    pub fn call(&mut self, function: &FunctionRef, args: &[Object]) -> GoResult<Object> {
        if args.len() != function.arity() {
            return Err(GoError::ArityMismatch {
                function: function.name().to_string(),
                expected: function.arity(),
                found: args.len(),
            });
        }

        match &function.body {
            Body::Native(body) => (**body)(self, args),
            Body::Scoped(inner) => self.scoped(|ctx| ctx.call(inner, args)),
        }
    }

    pub fn call_named(&mut self, name: &str, args: &[Object]) -> GoResult<Object> {
        let function = self.function(name)?;
        self.call(&function, args)
    }

    /// Looks up the method `name` on the record type of `receiver`.
    pub fn method(&self, receiver: &Object, name: &str) -> GoResult<BoundMethod> {
        let ty = RecordTypeRef::clone(receiver.record()?.read().ty());
        match self.methods.get(&ty, name) {
            Some(function) => Ok(BoundMethod {
                receiver: receiver.clone(),
                function: FunctionRef::clone(function),
            }),
            None => Err(GoError::UndefinedMethod {
                ty: ty.name().to_string(),
                method: name.to_string(),
            }),
        }
    }

    pub fn has_method(&self, receiver: &Object, name: &str) -> bool {
        self.method(receiver, name).is_ok()
    }

    pub fn call_method(
        &mut self,
        receiver: &Object,
        name: &str,
        args: &[Object],
    ) -> GoResult<Object> {
        self.method(receiver, name)?.call(self, args)
    }

    /// Textual representation of `value`. Records whose type has a stringer
    /// method are rendered by calling it.
    pub fn repr(&mut self, value: &Object) -> GoResult<String> {
        let stringer = value.as_record().and_then(|record| {
            let ty = RecordTypeRef::clone(record.read().ty());
            self.methods.stringer(&ty).cloned()
        });

        let Some(stringer) = stringer else {
            return Ok(value.to_string());
        };

        match self.call(&stringer, std::slice::from_ref(value))? {
            Object::Str(repr) => Ok(repr),
            other => Err(GoError::InvalidRepr {
                ty: stringer.receiver().unwrap_or_default().to_string(),
                found: other.type_name(),
            }),
        }
    }

    /// Registers `callback` in the cleanup scope of the innermost running
    /// wrapped call.
    pub fn defer(
        &mut self,
        callback: impl FnOnce(&mut GoContext) -> GoResult<()> + 'static,
    ) -> GoResult<()> {
        self.cleanup.defer(Box::new(callback))?;
        trace!(
            "Deferred call #{} at depth {}",
            self.cleanup.pending(),
            self.cleanup.depth()
        );
        Ok(())
    }

    /// Number of cleanup scopes currently open.
    pub fn cleanup_depth(&self) -> usize {
        self.cleanup.depth()
    }

    /// Runs `body` inside a fresh cleanup scope.
    ///
    /// Once `body` returns, fails or panics, the callbacks deferred in the
    /// scope run in reverse registration order. Every callback runs even if an
    /// earlier one failed or panicked. An error or panic of `body` takes
    /// precedence over those of the callbacks; otherwise the first callback
    /// failure is reported and later ones are only logged.
    pub fn scoped<T>(&mut self, body: impl FnOnce(&mut GoContext) -> GoResult<T>) -> GoResult<T> {
        self.cleanup.push_scope();
        let depth = self.cleanup.depth();
        trace!("Entered cleanup scope at depth {}", depth);

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| body(self)));

        debug_assert_eq!(self.cleanup.depth(), depth);
        let mut scope = self.cleanup.pop_scope().unwrap_or_default();
        trace!(
            "Draining {} deferred call(s) at depth {}",
            scope.len(),
            depth
        );

        let mut failures: Vec<Either<GoError, PanicPayload>> = Vec::new();
        while let Some(deferred) = scope.pop() {
            let ctx = &mut *self;
            match panic::catch_unwind(AssertUnwindSafe(move || deferred(ctx))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => failures.push(Either::Left(err)),
                Err(payload) => failures.push(Either::Right(payload)),
            }
        }

        let mut failures = failures.into_iter();
        let primary = match outcome {
            Ok(Ok(value)) => match failures.next() {
                None => return Ok(value),
                Some(failure) => failure,
            },
            Ok(Err(err)) => Either::Left(err),
            Err(payload) => Either::Right(payload),
        };

        for suppressed in failures {
            match suppressed {
                Either::Left(err) => warn!("Suppressed error in deferred call: {}", err),
                Either::Right(payload) => warn!(
                    "Suppressed panic in deferred call: {}",
                    panic_message(&payload)
                ),
            }
        }

        match primary {
            Either::Left(err) => Err(err),
            Either::Right(payload) => panic::resume_unwind(payload),
        }
    }
}

/// Converts the result of an entry function into a process exit status.
fn exit_status(value: &Object) -> i32 {
    match value {
        Object::Nil => 0,
        Object::Bool(value) => i32::from(*value),
        Object::Int(value) => match value.to_i32() {
            Some(code) => code,
            None => {
                error!("Exit status {} does not fit in an i32", value);
                1
            }
        },
        other => {
            error!("{}", other);
            1
        }
    }
}

fn panic_message(payload: &PanicPayload) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "<non-string panic payload>"
    }
}

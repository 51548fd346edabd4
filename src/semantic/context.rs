//! Analysis context
//!
//! Everything one analysis run mutates: the type registry, the symbol
//! table, the two storage cursors and the diagnostics. A context is reset
//! before every run so nothing leaks between runs.

use log::debug;

use crate::ast::{FunDecl, Storage, VarDecl};
use crate::error::{Diagnostics, SemaError, SemaResult, SourceLocation};
use crate::semantic::symtab::SymbolTable;
use crate::types::{FuncType, RegistryError, StructType, TypeInfo, TypeRegistry};

/// First local slot of a function frame; the slots above hold frame bookkeeping
pub const FRAME_START: i64 = -2;

/// Offset of the first parameter in a frame
pub const FIRST_PARAM_OFFSET: i64 = 1;

/// Analyzer configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalyzerOptions {
    /// Capture a listing of the global symbol scope after analysis
    pub trace_analyze: bool,
    /// Emit ANSI colors when rendering diagnostics
    pub color: bool,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self {
            trace_analyze: false,
            color: true,
        }
    }
}

/// Mutable state of a single analysis run
#[derive(Debug)]
pub struct AnalysisContext {
    pub registry: TypeRegistry,
    pub symbols: SymbolTable,
    pub diagnostics: Diagnostics,
    pub options: AnalyzerOptions,
    /// Global storage cursor, grows downward from 0
    location: i64,
    /// Local storage cursor of the current frame, grows downward
    stack_offset: i64,
    /// Local cursor saved when each open scope was entered
    scope_marks: Vec<i64>,
}

impl Default for AnalysisContext {
    fn default() -> Self {
        Self::new(AnalyzerOptions::default())
    }
}

impl AnalysisContext {
    pub fn new(options: AnalyzerOptions) -> Self {
        Self {
            registry: TypeRegistry::new(),
            symbols: SymbolTable::new(),
            diagnostics: Diagnostics::new(),
            options,
            location: 0,
            stack_offset: 0,
            scope_marks: Vec::new(),
        }
    }

    /// Return to the initial state
    pub fn reset(&mut self) {
        self.registry.clear();
        self.symbols.clear();
        self.diagnostics.clear();
        self.location = 0;
        self.stack_offset = 0;
        self.scope_marks.clear();
    }

    pub fn depth(&self) -> usize {
        self.symbols.depth()
    }

    pub fn global_cursor(&self) -> i64 {
        self.location
    }

    pub fn local_cursor(&self) -> i64 {
        self.stack_offset
    }

    // ===== Diagnostics =====

    pub fn define_error(&mut self, message: impl Into<String>, line: usize) {
        self.diagnostics
            .report(SemaError::define_error(message, SourceLocation::at(line)));
    }

    pub fn type_error(&mut self, message: impl Into<String>, line: usize) {
        self.diagnostics
            .report(SemaError::type_error(message, SourceLocation::at(line)));
    }

    // ===== Scopes and storage =====

    /// Open a nested scope; its locals are released when it closes
    pub fn enter_scope(&mut self) {
        self.scope_marks.push(self.stack_offset);
        self.symbols.enter_scope();
    }

    pub fn exit_scope(&mut self) {
        self.symbols.exit_scope();
        if let Some(mark) = self.scope_marks.pop() {
            self.stack_offset = mark;
        }
    }

    /// Start a new function frame
    pub fn begin_frame(&mut self) {
        self.stack_offset = FRAME_START;
    }

    /// Open an if/repeat block; outside any function the block gets a frame of its own
    pub fn enter_block(&mut self) {
        if self.depth() == 0 {
            self.begin_frame();
        }
        self.enter_scope();
    }

    fn allocate_global(&mut self, size: usize) -> Option<i64> {
        bump_down(&mut self.location, size)
    }

    fn allocate_local(&mut self, size: usize) -> Option<i64> {
        bump_down(&mut self.stack_offset, size)
    }

    /// Report storage that does not fit the offset range; yields a placeholder offset
    fn out_of_range(&mut self, name: &str, line: usize) -> i64 {
        self.type_error(
            format!("storage for '{}' exceeds the addressable range", name),
            line,
        );
        0
    }

    /// Storage size of `ty`, reporting types that cannot be laid out
    fn storage_size(&mut self, ty: &TypeInfo, line: usize) -> usize {
        match self.registry.size_of(ty) {
            Ok(size) => size,
            Err(RegistryError::UnresolvedType(name)) => {
                self.define_error(format!("undefined struct type '{}'", name), line);
                0
            }
            Err(err) => {
                self.type_error(err.to_string(), line);
                0
            }
        }
    }

    /// Declare a variable in the innermost scope
    ///
    /// Globals are allocated from the global cursor, locals from the frame.
    /// Returns false when the name is already declared in this scope.
    pub fn declare_var(&mut self, decl: &mut VarDecl) -> bool {
        let scope = self.depth();
        if self.symbols.is_declared_in(&decl.name, scope) {
            self.define_error(format!("duplicate definition of '{}'", decl.name), decl.line);
            return false;
        }

        let size = self.storage_size(&decl.ty, decl.line);
        let allocated = if scope == 0 {
            self.allocate_global(size)
        } else {
            self.allocate_local(size)
        };
        let offset = match allocated {
            Some(offset) => offset,
            None => self.out_of_range(&decl.name, decl.line),
        };
        self.symbols
            .insert(&decl.name, decl.line, offset, size, scope, decl.ty.clone());
        decl.storage = Some(Storage {
            offset,
            size,
            scope,
        });
        true
    }

    /// Declare parameters at increasing frame offsets
    pub fn declare_params(&mut self, params: &mut [VarDecl]) {
        let scope = self.depth();
        let mut offset = FIRST_PARAM_OFFSET;

        for param in params.iter_mut() {
            if self.symbols.is_declared_in(&param.name, scope) {
                self.define_error(format!("duplicate definition of '{}'", param.name), param.line);
                continue;
            }
            let size = self.storage_size(&param.ty, param.line);
            self.symbols
                .insert(&param.name, param.line, offset, size, scope, param.ty.clone());
            param.storage = Some(Storage {
                offset,
                size,
                scope,
            });
            offset = match i64::try_from(size).ok().and_then(|size| offset.checked_add(size)) {
                Some(next) => next,
                None => {
                    self.out_of_range(&param.name, param.line);
                    offset
                }
            };
        }
    }

    /// Bind a function name in the global scope (one storage unit)
    pub fn declare_function_name(&mut self, fun: &mut FunDecl, line: usize) -> bool {
        if self.symbols.is_declared_in(&fun.name, 0) {
            self.define_error(format!("duplicate definition of '{}'", fun.name), line);
            return false;
        }
        let offset = match self.allocate_global(1) {
            Some(offset) => offset,
            None => self.out_of_range(&fun.name, line),
        };
        let ty = TypeInfo::Func(Box::new(fun.func_type()));
        self.symbols.insert(&fun.name, line, offset, 1, 0, ty);
        fun.storage = Some(Storage {
            offset,
            size: 1,
            scope: 0,
        });
        true
    }

    /// Make a function's type visible while its body is analyzed
    pub fn register_function(&mut self, fun: &FunDecl, line: usize) -> bool {
        match self.registry.register_function(fun.func_type()) {
            Ok(()) => true,
            Err(err) => {
                self.define_error(err.to_string(), line);
                false
            }
        }
    }

    pub fn unregister_function(&mut self, name: &str) -> SemaResult<()> {
        self.registry
            .unregister(name)
            .map(|_| ())
            .map_err(|err| SemaError::internal_error(err.to_string()))
    }

    /// Lay out and register a struct; reports failures
    pub fn register_struct(&mut self, name: &str, members: &[VarDecl], line: usize) -> bool {
        let fields = members
            .iter()
            .map(|m| (m.name.clone(), m.ty.clone()))
            .collect();

        let stype = match StructType::layout(name, fields, &self.registry) {
            Ok(stype) => stype,
            Err(RegistryError::UnresolvedType(missing)) => {
                self.define_error(format!("undefined struct type '{}'", missing), line);
                return false;
            }
            Err(err) => {
                self.type_error(err.to_string(), line);
                return false;
            }
        };

        match self.registry.register_struct(stype) {
            Ok(()) => true,
            Err(err) => {
                self.define_error(err.to_string(), line);
                false
            }
        }
    }

    /// Signature of a callable name
    ///
    /// The function currently being analyzed is found in the registry;
    /// other functions through their global binding.
    pub fn resolve_function(&self, name: &str) -> Option<FuncType> {
        if let Ok(ftype) = self.registry.lookup_function(name) {
            return Some(ftype.clone());
        }
        match self.symbols.lookup(name) {
            Some(entry) => match &entry.ty {
                TypeInfo::Func(ftype) => Some((**ftype).clone()),
                _ => None,
            },
            None => {
                debug!("no function named '{}'", name);
                None
            }
        }
    }
}

/// Take `size` units below `cursor`, returning the offset of the new slot
fn bump_down(cursor: &mut i64, size: usize) -> Option<i64> {
    let size = i64::try_from(size).ok()?;
    *cursor = cursor.checked_sub(size)?;
    Some(*cursor + 1)
}

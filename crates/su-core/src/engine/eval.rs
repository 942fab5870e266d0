//! Component L — the tree-walk execution engine (spec §4.L).
//!
//! Every expression evaluation returns `(Value, was_printed)`: `was_printed`
//! is OR'd upward through every sub-expression so a statement like
//! `print(1) | id` still reports a printed result at the top, without a
//! second, separate "did anything print" channel threaded alongside scope
//! and error handling.

use std::sync::Arc;

use num_bigint::BigInt;
use num_traits::cast::ToPrimitive;

use crate::ast::{
    AssignTarget, BinaryOp, Expr, ExprNode, Literal, ObjectKey, Pattern, PatternSegment, SegmentTarget, SegmentType,
    Stmt, StmtNode, UnaryOp,
};
use crate::bitstring::{build_segment, match_segment, BitBuffer, Bitstring};
use crate::error::{Error, ErrorKind, Position, SuResult};
use crate::io::PrintWriter;
use crate::scope::Scope;
use crate::value::Value;

use super::{builtins, Engine, Outcome, Signal};

impl<P: PrintWriter> Engine<P> {
    pub(super) fn exec_stmts(&mut self, stmts: &[StmtNode], scope: &Scope) -> SuResult<Signal> {
        for stmt in stmts {
            let (signal, _) = self.exec_stmt(stmt, scope)?;
            if !matches!(signal, Signal::None) {
                return Ok(signal);
            }
        }
        Ok(Signal::None)
    }

    pub(super) fn exec_block(&mut self, stmts: &[StmtNode], parent: &Scope) -> SuResult<Signal> {
        self.exec_stmts(stmts, &parent.child())
    }

    pub(crate) fn exec_stmt(&mut self, stmt: &StmtNode, scope: &Scope) -> SuResult<(Signal, Outcome)> {
        let pos = stmt.pos;
        match &stmt.node {
            Stmt::ExprStmt(expr) => {
                let (value, printed) = self.eval_expr(expr, scope)?;
                Ok((Signal::None, Outcome::of(value, printed)))
            }
            Stmt::Assign { target, value } => {
                let printed = self.exec_assign(target, value, scope, pos)?;
                Ok((Signal::None, Outcome::of(Value::Nil, printed)))
            }
            Stmt::Block(stmts) => {
                let signal = self.exec_block(stmts, scope)?;
                Ok((signal, Outcome::none()))
            }
            Stmt::If { branches, else_branch } => {
                for (cond, body) in branches {
                    let (c, printed) = self.eval_expr(cond, scope)?;
                    if c.is_truthy() {
                        let signal = self.exec_block(body, scope)?;
                        return Ok((signal, Outcome::of(Value::Nil, printed)));
                    }
                }
                if let Some(body) = else_branch {
                    let signal = self.exec_block(body, scope)?;
                    return Ok((signal, Outcome::none()));
                }
                Ok((Signal::None, Outcome::none()))
            }
            Stmt::While { cond, body } => {
                loop {
                    let (c, _) = self.eval_expr(cond, scope)?;
                    if !c.is_truthy() {
                        break;
                    }
                    match self.exec_block(body, scope)? {
                        Signal::Break => break,
                        Signal::Continue | Signal::None => {}
                    }
                }
                Ok((Signal::None, Outcome::none()))
            }
            Stmt::NumericFor { var, start, stop, step, body } => {
                self.exec_numeric_for(var, start, stop, step.as_ref(), body, scope, pos)?;
                Ok((Signal::None, Outcome::none()))
            }
            Stmt::ForIn { var, iter, body } => {
                self.exec_for_in(var, iter, body, scope)?;
                Ok((Signal::None, Outcome::none()))
            }
            Stmt::CStyleFor { init, cond, post, body } => {
                self.exec_c_style_for(init.as_deref(), cond.as_ref(), post.as_deref(), body, scope)?;
                Ok((Signal::None, Outcome::none()))
            }
            Stmt::Match { subject, arms } => {
                let (value, printed) = self.eval_expr(subject, scope)?;
                for (pattern, body) in arms {
                    let arm_scope = scope.child();
                    if self.match_pattern(pattern, &value, &arm_scope, pos)? {
                        let signal = self.exec_stmts(body, &arm_scope)?;
                        return Ok((signal, Outcome::of(Value::Nil, printed)));
                    }
                }
                Ok((Signal::None, Outcome::of(Value::Nil, printed)))
            }
            Stmt::CodeBlock { language, exported_names, code } => {
                self.exec_code_block(language, exported_names, code, scope)?;
                Ok((Signal::None, Outcome::none()))
            }
            Stmt::Import(_) => Ok((Signal::None, Outcome::none())),
            Stmt::Break => Ok((Signal::Break, Outcome::none())),
            Stmt::Continue => Ok((Signal::Continue, Outcome::none())),
            Stmt::LanguageCall { call, background } => {
                if *background {
                    self.submit_background(call, scope)?;
                } else {
                    self.eval_expr(call, scope)?;
                }
                Ok((Signal::None, Outcome::none()))
            }
        }
    }

    fn exec_assign(&mut self, target: &AssignTarget, value: &ExprNode, scope: &Scope, pos: Position) -> SuResult<bool> {
        match target {
            AssignTarget::Var(name) => {
                let (v, printed) = self.eval_expr(value, scope)?;
                scope.assign(name, v)?;
                Ok(printed)
            }
            AssignTarget::Qualified(lang, name) => {
                let (v, printed) = self.eval_expr(value, scope)?;
                self.adapters.set_variable(lang, name, v)?;
                Ok(printed)
            }
            AssignTarget::Index(obj_expr, idx_expr) => {
                let (obj, p1) = self.eval_expr(obj_expr, scope)?;
                let (idx, p2) = self.eval_expr(idx_expr, scope)?;
                let (v, p3) = self.eval_expr(value, scope)?;
                assign_index(&obj, &idx, v, pos)?;
                Ok(p1 || p2 || p3)
            }
            AssignTarget::BitstringPattern(segments) => self.exec_bitstring_assign(segments, value, scope, pos),
        }
    }

    pub(super) fn eval_expr(&mut self, expr: &ExprNode, scope: &Scope) -> SuResult<(Value, bool)> {
        let pos = expr.pos;
        match &expr.node {
            Expr::Literal(lit) => Ok((literal_value(lit), false)),
            Expr::Var(name) => {
                let v = scope.get(name).ok_or_else(|| Error::unbound(name).at(pos))?;
                Ok((v, false))
            }
            Expr::QualifiedVar(lang, name) => Ok((self.adapters.get_variable(lang, name)?, false)),
            Expr::Group(inner) => self.eval_expr(inner, scope),
            Expr::Index(obj_expr, idx_expr) => {
                let (obj, p1) = self.eval_expr(obj_expr, scope)?;
                let (idx, p2) = self.eval_expr(idx_expr, scope)?;
                Ok((index_value(&obj, &idx, pos)?, p1 || p2))
            }
            Expr::Unary(op, inner) => {
                let (v, printed) = self.eval_expr(inner, scope)?;
                Ok((eval_unary(*op, &v, pos)?, printed))
            }
            Expr::Binary(BinaryOp::And, lhs, rhs) => {
                let (l, p1) = self.eval_expr(lhs, scope)?;
                if !l.is_truthy() {
                    return Ok((l, p1));
                }
                let (r, p2) = self.eval_expr(rhs, scope)?;
                Ok((r, p1 || p2))
            }
            Expr::Binary(BinaryOp::Or, lhs, rhs) => {
                let (l, p1) = self.eval_expr(lhs, scope)?;
                if l.is_truthy() {
                    return Ok((l, p1));
                }
                let (r, p2) = self.eval_expr(rhs, scope)?;
                Ok((r, p1 || p2))
            }
            Expr::Binary(op, lhs, rhs) => {
                let (l, p1) = self.eval_expr(lhs, scope)?;
                let (r, p2) = self.eval_expr(rhs, scope)?;
                Ok((eval_binary(*op, &l, &r, pos)?, p1 || p2))
            }
            Expr::SizeOf(inner) => {
                let (v, printed) = self.eval_expr(inner, scope)?;
                Ok((Value::Int(BigInt::from(builtins::value_size(&v).map_err(|e| e.at(pos))?)), printed))
            }
            Expr::Ternary { cond, then_branch, else_branch } => {
                let (c, p1) = self.eval_expr(cond, scope)?;
                let (v, p2) = if c.is_truthy() { self.eval_expr(then_branch, scope)? } else { self.eval_expr(else_branch, scope)? };
                Ok((v, p1 || p2))
            }
            Expr::Elvis(lhs, rhs) => {
                let (l, p1) = self.eval_expr(lhs, scope)?;
                if l.is_truthy() {
                    return Ok((l, p1));
                }
                let (r, p2) = self.eval_expr(rhs, scope)?;
                Ok((r, p1 || p2))
            }
            Expr::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                let mut printed = false;
                for item in items {
                    let (v, p) = self.eval_expr(item, scope)?;
                    out.push(v);
                    printed |= p;
                }
                Ok((Value::list(out), printed))
            }
            Expr::Object(entries) => {
                let mut map = indexmap::IndexMap::new();
                let mut printed = false;
                for (key, value_expr) in entries {
                    let key_str = match key {
                        ObjectKey::Ident(s) | ObjectKey::Str(s) => s.clone(),
                        ObjectKey::Computed(key_expr) => {
                            let (k, p) = self.eval_expr(key_expr, scope)?;
                            printed |= p;
                            k.display_print()
                        }
                    };
                    let (v, p) = self.eval_expr(value_expr, scope)?;
                    printed |= p;
                    map.insert(key_str, v);
                }
                Ok((Value::map(map), printed))
            }
            Expr::Bitstring(segments) => {
                let mut buf = BitBuffer::new();
                let mut printed = false;
                for seg in segments {
                    let (v, p) = self.eval_expr(&seg.value, scope)?;
                    printed |= p;
                    let resolved_size = match &seg.specs.size {
                        Some(size_expr) => {
                            let (s, p2) = self.eval_expr(size_expr, scope)?;
                            printed |= p2;
                            Some(as_u64(&s, pos)?)
                        }
                        None => None,
                    };
                    let built = build_segment(&v, &seg.specs, resolved_size).map_err(|e| map_build_err(e).at(pos))?;
                    buf.push_bits(&built.bits);
                }
                Ok((Value::Bitstring(Arc::new(Bitstring::from_buffer(buf))), printed))
            }
            Expr::Pipe(lhs, rhs) => {
                let (piped, p1) = self.eval_expr(lhs, scope)?;
                let rhs_unwrapped = unwrap_group(rhs);
                let (result, p2) = match &rhs_unwrapped.node {
                    Expr::Call { callee, args } => {
                        let mut values = Vec::with_capacity(args.len() + 1);
                        values.push(piped);
                        let mut printed = false;
                        for a in args {
                            let (v, p) = self.eval_expr(a, scope)?;
                            values.push(v);
                            printed |= p;
                        }
                        let (r, p3) = self.eval_call(callee, values, scope, pos)?;
                        (r, printed || p3)
                    }
                    _ => self.eval_call(rhs_unwrapped, vec![piped], scope, pos)?,
                };
                Ok((result, p1 || p2))
            }
            Expr::Call { callee, args } => {
                let mut values = Vec::with_capacity(args.len());
                let mut printed = false;
                for a in args {
                    let (v, p) = self.eval_expr(a, scope)?;
                    values.push(v);
                    printed |= p;
                }
                let (r, p2) = self.eval_call(callee, values, scope, pos)?;
                Ok((r, printed || p2))
            }
        }
    }

    fn eval_call(&mut self, callee: &ExprNode, args: Vec<Value>, scope: &Scope, pos: Position) -> SuResult<(Value, bool)> {
        match &unwrap_group(callee).node {
            Expr::Var(name) => builtins::call(name, &args, &mut self.print).map_err(|e| e.at(pos)),
            Expr::QualifiedVar(lang, name) => Ok((self.adapters.call_function(lang, name, args)?, false)),
            _ => {
                let _ = scope;
                Err(Error::new(ErrorKind::Semantic, "callee must be a builtin name or a qualified foreign function").at(pos))
            }
        }
    }

    fn exec_numeric_for(
        &mut self,
        var: &str,
        start: &ExprNode,
        stop: &ExprNode,
        step: Option<&ExprNode>,
        body: &[StmtNode],
        scope: &Scope,
        pos: Position,
    ) -> SuResult<()> {
        let (start_v, _) = self.eval_expr(start, scope)?;
        let (stop_v, _) = self.eval_expr(stop, scope)?;
        let step_n = match step {
            Some(step_expr) => {
                let (s, _) = self.eval_expr(step_expr, scope)?;
                as_bigint(&s, pos)?
            }
            None => BigInt::from(1),
        };
        if step_n == BigInt::from(0) {
            return Err(Error::new(ErrorKind::Semantic, "for-loop step cannot be 0").at(pos));
        }
        let mut i = as_bigint(&start_v, pos)?;
        let stop_n = as_bigint(&stop_v, pos)?;
        let ascending = step_n > BigInt::from(0);
        loop {
            if ascending {
                if i > stop_n {
                    break;
                }
            } else if i < stop_n {
                break;
            }
            let iter_scope = scope.child();
            iter_scope.declare(var, Value::Int(i.clone()));
            match self.exec_stmts(body, &iter_scope)? {
                Signal::Break => break,
                Signal::Continue | Signal::None => {}
            }
            i += &step_n;
        }
        Ok(())
    }

    fn exec_for_in(&mut self, var: &str, iter: &ExprNode, body: &[StmtNode], scope: &Scope) -> SuResult<()> {
        let pos = iter.pos;
        let (iterable, _) = self.eval_expr(iter, scope)?;
        let items: Vec<Value> = match &iterable {
            Value::List(items) => items.lock().expect("value list lock poisoned").clone(),
            Value::Map(entries) => entries.lock().expect("value map lock poisoned").values().cloned().collect(),
            other => {
                return Err(Error::new(ErrorKind::Semantic, format!("for-in requires a list or map, got {}", other.type_name()))
                    .at(pos))
            }
        };
        for item in items {
            let iter_scope = scope.child();
            iter_scope.declare(var, item);
            match self.exec_stmts(body, &iter_scope)? {
                Signal::Break => break,
                Signal::Continue | Signal::None => {}
            }
        }
        Ok(())
    }

    fn exec_c_style_for(
        &mut self,
        init: Option<&StmtNode>,
        cond: Option<&ExprNode>,
        post: Option<&StmtNode>,
        body: &[StmtNode],
        scope: &Scope,
    ) -> SuResult<()> {
        let loop_scope = scope.child();
        if let Some(init) = init {
            self.exec_stmt(init, &loop_scope)?;
        }
        loop {
            if let Some(cond) = cond {
                let (c, _) = self.eval_expr(cond, &loop_scope)?;
                if !c.is_truthy() {
                    break;
                }
            }
            match self.exec_stmts(body, &loop_scope)? {
                Signal::Break => break,
                Signal::Continue | Signal::None => {}
            }
            if let Some(post) = post {
                self.exec_stmt(post, &loop_scope)?;
            }
        }
        Ok(())
    }

    fn exec_code_block(&mut self, language: &str, exported_names: &[String], code: &str, scope: &Scope) -> SuResult<()> {
        let mut inputs = crate::adapter::VariableBindings::new();
        for name in exported_names {
            if let Some(v) = scope.get(name) {
                inputs.insert(name.clone(), v);
            }
        }
        let outputs = self.adapters.execute_code_block_with_variables(language, code, inputs, exported_names.to_vec())?;
        for (name, v) in outputs {
            scope.assign(&name, v)?;
        }
        Ok(())
    }

    fn submit_background(&mut self, call: &ExprNode, scope: &Scope) -> SuResult<()> {
        let pos = call.pos;
        let call_node = unwrap_group(call);
        let (callee, args) = match &call_node.node {
            Expr::Call { callee, args } => (callee, args),
            _ => return Err(Error::new(ErrorKind::Semantic, "background tasks must call a function").at(pos)),
        };
        let (lang, name) = match &unwrap_group(callee).node {
            Expr::QualifiedVar(lang, name) => (lang.clone(), name.clone()),
            _ => {
                return Err(Error::new(ErrorKind::Semantic, "background tasks must call a qualified foreign function").at(pos))
            }
        };
        let mut values = Vec::with_capacity(args.len());
        for a in args {
            let (v, _) = self.eval_expr(a, scope)?;
            values.push(v);
        }
        let marshalled: Vec<serde_json::Value> =
            values.iter().map(crate::marshal::to_foreign).collect::<SuResult<_>>().map_err(|e| e.at(pos))?;
        let mut adapter = self.adapters.isolate(&lang)?;
        let job_lang = lang.clone();
        let job_name = name.clone();
        self.jobs.submit(&job_lang, move || {
            let restored: Vec<Value> = marshalled.iter().map(crate::marshal::from_foreign).collect();
            let result = adapter.call_function(&job_name, &restored)?;
            crate::marshal::to_foreign(&result)
        });
        Ok(())
    }

    fn match_pattern(&mut self, pattern: &Pattern, value: &Value, scope: &Scope, pos: Position) -> SuResult<bool> {
        match pattern {
            Pattern::Wildcard => Ok(true),
            Pattern::Var(name) => {
                scope.declare(name, value.clone());
                Ok(true)
            }
            Pattern::Literal(lit) => Ok(Value::values_equal(&literal_value(lit), value)),
            Pattern::ExprLiteral(expr) => {
                let (v, _) = self.eval_expr(expr, scope)?;
                Ok(Value::values_equal(&v, value))
            }
            Pattern::Bitstring(segments) => self.match_bitstring_segments(segments, value, scope, pos),
            Pattern::Array { items, rest } => {
                let elems = match value {
                    Value::List(list) => list.lock().expect("value list lock poisoned").clone(),
                    _ => return Ok(false),
                };
                if rest.is_none() && elems.len() != items.len() {
                    return Ok(false);
                }
                if rest.is_some() && elems.len() < items.len() {
                    return Ok(false);
                }
                for (p, v) in items.iter().zip(elems.iter()) {
                    if !self.match_pattern(p, v, scope, pos)? {
                        return Ok(false);
                    }
                }
                if let Some(rest_name) = rest {
                    scope.declare(rest_name, Value::list(elems[items.len()..].to_vec()));
                }
                Ok(true)
            }
            Pattern::Object(fields) => {
                let map = match value {
                    Value::Map(m) => m.lock().expect("value map lock poisoned").clone(),
                    _ => return Ok(false),
                };
                for (key, p) in fields {
                    match map.get(key) {
                        Some(v) => {
                            if !self.match_pattern(p, v, scope, pos)? {
                                return Ok(false);
                            }
                        }
                        None => return Ok(false),
                    }
                }
                Ok(true)
            }
        }
    }

    fn match_bitstring_segments(
        &mut self,
        segments: &[PatternSegment],
        subject: &Value,
        scope: &Scope,
        pos: Position,
    ) -> SuResult<bool> {
        let source = match subject {
            Value::Bitstring(b) => (**b).clone(),
            Value::Str(s) => Bitstring::from_bytes(s.as_bytes().to_vec()),
            _ => return Ok(false),
        };
        let mut offset = 0u64;
        for (i, seg) in segments.iter().enumerate() {
            let is_last = i == segments.len() - 1;
            let unsized_container = seg.specs.size.is_none() && matches!(seg.specs.ty, SegmentType::Binary | SegmentType::Bitstring);
            if unsized_container && !is_last {
                return Err(Error::new(
                    ErrorKind::AmbiguousTail,
                    "an unsized binary/bitstring segment must be the last segment in a pattern",
                )
                .at(pos));
            }
            let resolved_size = match &seg.specs.size {
                Some(size_expr) => {
                    let (s, _) = self.eval_expr(size_expr, scope)?;
                    Some(as_u64(&s, pos)?)
                }
                None => None,
            };
            let matched = match match_segment(&source, offset, &seg.specs, resolved_size) {
                Ok(m) => m,
                Err(_) => return Ok(false),
            };
            match &seg.target {
                SegmentTarget::Bind(name) => match scope.get_local(name) {
                    Some(existing) if !Value::values_equal(&existing, &matched.value) => {
                        return Err(Error::new(
                            ErrorKind::RebindingMismatch,
                            format!("'{name}' was already bound to a different value earlier in this bitstring pattern"),
                        )
                        .at(pos));
                    }
                    _ => scope.declare(name, matched.value),
                },
                SegmentTarget::Wildcard => {}
                SegmentTarget::Literal(lit) => {
                    if !Value::values_equal(&literal_value(lit), &matched.value) {
                        return Ok(false);
                    }
                }
            }
            offset += matched.bits_consumed;
        }
        Ok(offset == source.bit_len())
    }

    fn exec_bitstring_assign(
        &mut self,
        segments: &[PatternSegment],
        value_expr: &ExprNode,
        scope: &Scope,
        pos: Position,
    ) -> SuResult<bool> {
        let (subject, printed) = self.eval_expr(value_expr, scope)?;
        let temp = scope.child();
        if !self.match_bitstring_segments(segments, &subject, &temp, pos)? {
            return Err(Error::new(ErrorKind::LiteralMismatch, "bitstring pattern did not match").at(pos));
        }
        for seg in segments {
            if let SegmentTarget::Bind(name) = &seg.target {
                let v = temp.get(name).expect("bound name missing from temp scope after successful match");
                scope.assign(name, v)?;
            }
        }
        Ok(printed)
    }
}

fn unwrap_group(expr: &ExprNode) -> &ExprNode {
    match &expr.node {
        Expr::Group(inner) => unwrap_group(inner),
        _ => expr,
    }
}

fn literal_value(lit: &Literal) -> Value {
    match lit {
        Literal::Int(n) => Value::Int(n.clone()),
        Literal::Float(f) => Value::Float(*f),
        Literal::Str(s) => Value::str(s.clone()),
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Nil => Value::Nil,
    }
}

fn map_build_err(err: crate::bitstring::BuildError) -> Error {
    use crate::bitstring::BuildError;
    match err {
        BuildError::MissingSize => Error::new(ErrorKind::InvalidSize, "bitstring segment needs an explicit size"),
        BuildError::InvalidFloatSize => Error::new(ErrorKind::Semantic, "float segments must be 16, 32 or 64 bits"),
        BuildError::SizedUtfSegment => Error::new(ErrorKind::Semantic, "utf8/utf16/utf32 segments cannot declare a size"),
        BuildError::TypeMismatch => Error::new(ErrorKind::Semantic, "value does not match its segment's declared type"),
    }
}

fn type_err(op_name: &str, l: &Value, r: &Value, pos: Position) -> Error {
    Error::new(ErrorKind::Semantic, format!("cannot apply '{op_name}' to {} and {}", l.type_name(), r.type_name())).at(pos)
}

fn as_bigint(v: &Value, pos: Position) -> SuResult<BigInt> {
    match v {
        Value::Int(n) => Ok(n.clone()),
        Value::Bool(b) => Ok(BigInt::from(u8::from(*b))),
        other => Err(Error::new(ErrorKind::Semantic, format!("expected an integer, got {}", other.type_name())).at(pos)),
    }
}

fn as_u64(v: &Value, pos: Position) -> SuResult<u64> {
    as_bigint(v, pos)?
        .to_u64()
        .ok_or_else(|| Error::new(ErrorKind::InvalidSize, "size expression did not evaluate to a non-negative integer").at(pos))
}

fn as_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Int(n) => n.to_f64(),
        Value::Float(f) => Some(*f),
        _ => None,
    }
}

fn numeric_op(l: &Value, r: &Value, int_op: impl Fn(&BigInt, &BigInt) -> BigInt, float_op: impl Fn(f64, f64) -> f64) -> Option<Value> {
    if let (Value::Int(a), Value::Int(b)) = (l, r) {
        return Some(Value::Int(int_op(a, b)));
    }
    let (a, b) = (as_f64(l)?, as_f64(r)?);
    Some(Value::Float(float_op(a, b)))
}

fn int_op(l: &Value, r: &Value, f: impl Fn(BigInt, BigInt) -> BigInt) -> Option<BigInt> {
    match (l, r) {
        (Value::Int(a), Value::Int(b)) => Some(f(a.clone(), b.clone())),
        _ => None,
    }
}

fn bigint_pow(base: &BigInt, exp: u32) -> BigInt {
    let mut result = BigInt::from(1);
    let mut base = base.clone();
    let mut exp = exp;
    while exp > 0 {
        if exp & 1 == 1 {
            result *= &base;
        }
        base = &base * &base;
        exp >>= 1;
    }
    result
}

fn eval_binary(op: BinaryOp, l: &Value, r: &Value, pos: Position) -> SuResult<Value> {
    match op {
        BinaryOp::Add => numeric_op(l, r, |a, b| a + b, |a, b| a + b).ok_or_else(|| type_err("+", l, r, pos)),
        BinaryOp::Sub => numeric_op(l, r, |a, b| a - b, |a, b| a - b).ok_or_else(|| type_err("-", l, r, pos)),
        BinaryOp::Mul => numeric_op(l, r, |a, b| a * b, |a, b| a * b).ok_or_else(|| type_err("*", l, r, pos)),
        BinaryOp::Div => {
            let (a, b) = (as_f64(l).ok_or_else(|| type_err("/", l, r, pos))?, as_f64(r).ok_or_else(|| type_err("/", l, r, pos))?);
            if b == 0.0 {
                return Err(Error::new(ErrorKind::Semantic, "division by zero").at(pos));
            }
            Ok(Value::Float(a / b))
        }
        BinaryOp::Mod => match (l, r) {
            (Value::Int(a), Value::Int(b)) => {
                if b == &BigInt::from(0) {
                    return Err(Error::new(ErrorKind::Semantic, "division by zero").at(pos));
                }
                Ok(Value::Int(a % b))
            }
            _ => {
                let (a, b) = (as_f64(l).ok_or_else(|| type_err("%", l, r, pos))?, as_f64(r).ok_or_else(|| type_err("%", l, r, pos))?);
                Ok(Value::Float(a % b))
            }
        },
        BinaryOp::Pow => match (l, r) {
            (Value::Int(a), Value::Int(b)) if *b >= BigInt::from(0) => match b.to_u32() {
                Some(exp) => Ok(Value::Int(bigint_pow(a, exp))),
                None => Err(Error::new(ErrorKind::Semantic, "exponent too large").at(pos)),
            },
            _ => {
                let (a, b) = (as_f64(l).ok_or_else(|| type_err("**", l, r, pos))?, as_f64(r).ok_or_else(|| type_err("**", l, r, pos))?);
                Ok(Value::Float(a.powf(b)))
            }
        },
        BinaryOp::Concat => match (l, r) {
            (Value::Str(a), Value::Str(b)) => Ok(Value::str(format!("{a}{b}"))),
            (Value::List(a), Value::List(b)) => {
                let mut out = a.lock().expect("value list lock poisoned").clone();
                out.extend(b.lock().expect("value list lock poisoned").iter().cloned());
                Ok(Value::list(out))
            }
            _ => Err(type_err("++", l, r, pos)),
        },
        BinaryOp::BitAnd => int_op(l, r, |a, b| a & b).map(Value::Int).ok_or_else(|| type_err("&", l, r, pos)),
        BinaryOp::BitOr => int_op(l, r, |a, b| a | b).map(Value::Int).ok_or_else(|| type_err("|", l, r, pos)),
        BinaryOp::BitXor => int_op(l, r, |a, b| a ^ b).map(Value::Int).ok_or_else(|| type_err("^", l, r, pos)),
        BinaryOp::Shl => shift_op(l, r, true, pos),
        BinaryOp::Shr => shift_op(l, r, false, pos),
        BinaryOp::Lt => compare(l, r, pos, "<", Ordering::is_lt),
        BinaryOp::Le => compare(l, r, pos, "<=", Ordering::is_le),
        BinaryOp::Gt => compare(l, r, pos, ">", Ordering::is_gt),
        BinaryOp::Ge => compare(l, r, pos, ">=", Ordering::is_ge),
        BinaryOp::Eq => Ok(Value::Bool(Value::values_equal(l, r))),
        BinaryOp::NotEq => Ok(Value::Bool(!Value::values_equal(l, r))),
        BinaryOp::And | BinaryOp::Or => unreachable!("short-circuited before generic dispatch"),
    }
}

use std::cmp::Ordering;

fn compare(l: &Value, r: &Value, pos: Position, name: &str, f: impl Fn(Ordering) -> bool) -> SuResult<Value> {
    match Value::partial_compare(l, r) {
        Some(ord) => Ok(Value::Bool(f(ord))),
        None => Err(type_err(name, l, r, pos)),
    }
}

fn shift_op(l: &Value, r: &Value, left: bool, pos: Position) -> SuResult<Value> {
    let (a, b) = match (l, r) {
        (Value::Int(a), Value::Int(b)) => (a, b),
        _ => return Err(type_err(if left { "<<" } else { ">>" }, l, r, pos)),
    };
    let amount = b.to_u32().ok_or_else(|| Error::new(ErrorKind::Semantic, "shift amount out of range").at(pos))?;
    let a = a.clone();
    Ok(Value::Int(if left { a << amount } else { a >> amount }))
}

fn eval_unary(op: UnaryOp, v: &Value, pos: Position) -> SuResult<Value> {
    match op {
        UnaryOp::Neg => match v {
            Value::Int(n) => Ok(Value::Int(-n.clone())),
            Value::Float(f) => Ok(Value::Float(-f)),
            other => Err(Error::new(ErrorKind::Semantic, format!("cannot negate {}", other.type_name())).at(pos)),
        },
        UnaryOp::Not => Ok(Value::Bool(!v.is_truthy())),
        UnaryOp::BitNot => match v {
            Value::Int(n) => Ok(Value::Int(!n.clone())),
            other => Err(Error::new(ErrorKind::Semantic, format!("cannot bitwise-not {}", other.type_name())).at(pos)),
        },
    }
}

fn index_value(value: &Value, index: &Value, pos: Position) -> SuResult<Value> {
    match value {
        Value::List(items) => {
            let items = items.lock().expect("value list lock poisoned");
            let i = as_bigint(index, pos)?.to_i64().ok_or_else(|| Error::new(ErrorKind::Semantic, "index out of range").at(pos))?;
            let len = items.len() as i64;
            let resolved = if i < 0 { i + len } else { i };
            items
                .get(usize::try_from(resolved).map_err(|_| Error::new(ErrorKind::Semantic, "index out of range").at(pos))?)
                .cloned()
                .ok_or_else(|| Error::new(ErrorKind::Semantic, "index out of range").at(pos))
        }
        Value::Map(entries) => {
            let entries = entries.lock().expect("value map lock poisoned");
            let key = match index {
                Value::Str(s) => s.to_string(),
                other => other.display_print(),
            };
            entries.get(&key).cloned().ok_or_else(|| Error::new(ErrorKind::Semantic, format!("no such key '{key}'")).at(pos))
        }
        Value::Bitstring(b) => {
            let bytes = b.as_bytes().ok_or_else(|| Error::new(ErrorKind::Semantic, "bitstring is not byte-aligned").at(pos))?;
            let i = as_bigint(index, pos)?.to_usize().ok_or_else(|| Error::new(ErrorKind::Semantic, "index out of range").at(pos))?;
            bytes
                .get(i)
                .map(|b| Value::Int(BigInt::from(*b)))
                .ok_or_else(|| Error::new(ErrorKind::Semantic, "index out of range").at(pos))
        }
        other => Err(Error::new(ErrorKind::Semantic, format!("{} is not indexable", other.type_name())).at(pos)),
    }
}

fn assign_index(obj: &Value, index: &Value, value: Value, pos: Position) -> SuResult<()> {
    match obj {
        Value::List(items) => {
            let mut items = items.lock().expect("value list lock poisoned");
            let i = as_bigint(index, pos)?.to_i64().ok_or_else(|| Error::new(ErrorKind::Semantic, "index out of range").at(pos))?;
            let len = items.len() as i64;
            let resolved = if i < 0 { i + len } else { i };
            let slot = usize::try_from(resolved)
                .ok()
                .and_then(|r| items.get_mut(r))
                .ok_or_else(|| Error::new(ErrorKind::Semantic, "index out of range").at(pos))?;
            *slot = value;
            Ok(())
        }
        Value::Map(entries) => {
            let mut entries = entries.lock().expect("value map lock poisoned");
            let key = match index {
                Value::Str(s) => s.to_string(),
                other => other.display_print(),
            };
            entries.insert(key, value);
            Ok(())
        }
        other => Err(Error::new(ErrorKind::Semantic, format!("{} is not indexable", other.type_name())).at(pos)),
    }
}

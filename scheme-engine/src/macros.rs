//! The `syntax-rules` macro engine (spec.md §4.3).
//!
//! Three stages, grounded directly on the reference interpreter's own
//! test scenarios: `is_match` (does a pattern match a form), `bind`
//! (build a [`MacroMap`] of pattern-variable bindings), and `transcribe`
//! (rewrite a template against those bindings, wrapping free identifiers
//! for hygiene).

use std::collections::HashMap;
use std::rc::Rc;

use crate::env::Scope;
use crate::error::{Error, Result};
use crate::handle::Handle;
use crate::symbol::SymbolId;
use crate::utils::{list_to_vec, vec_to_improper};
use crate::value::Value;

fn pair_parts(value: &Value) -> Option<(Value, Value)> {
    match value {
        Value::Pair(pair) => {
            let pair = pair.borrow();
            Some((pair.car.clone(), pair.cdr.clone()))
        }
        _ => None,
    }
}

fn is_ellipsis(value: &Value) -> bool {
    matches!(value, Value::Symbol(sym) if *sym == SymbolId::ELLIPSIS)
}

/// Pattern elements after an ellipsis still impose a minimum length on
/// whatever the ellipsis doesn't consume. Counts pair cells in `pattern`;
/// a pattern that itself nests another ellipsis at this same level is not
/// precisely sized by this (an acknowledged approximation - syntax-rules
/// hygiene and matching here is not a full R5RS implementation).
fn min_len(pattern: &Value) -> usize {
    let mut count = 0;
    let mut cur = pattern.clone();
    while let Some((_, cdr)) = pair_parts(&cur) {
        count += 1;
        cur = cdr;
    }
    count
}

/// Split a form into its leading elements and final (possibly improper)
/// tail.
fn spine(form: &Value) -> (Vec<Value>, Value) {
    let mut elems = Vec::new();
    let mut cur = form.clone();
    while let Some((car, cdr)) = pair_parts(&cur) {
        elems.push(car);
        cur = cdr;
    }
    (elems, cur)
}

/// `is-match(pattern, form, literals)` (spec.md §4.3).
pub fn is_match(pattern: &Value, form: &Value, literals: &[SymbolId]) -> bool {
    match pattern {
        Value::Symbol(sym) => {
            if literals.contains(sym) {
                matches!(form, Value::Symbol(f) if f == sym)
            } else {
                true
            }
        }
        Value::Empty => form.is_empty(),
        Value::Pair(_) => {
            let (car, cdr) = pair_parts(pattern).expect("pattern is a pair");
            if let Some((maybe_ellipsis, rest)) = pair_parts(&cdr) {
                if is_ellipsis(&maybe_ellipsis) {
                    return is_match_ellipsis(&car, &rest, form, literals);
                }
            }
            match pair_parts(form) {
                Some((fcar, fcdr)) => {
                    is_match(&car, &fcar, literals) && is_match(&cdr, &fcdr, literals)
                }
                None => false,
            }
        }
        other => other.literal_eq(form),
    }
}

fn is_match_ellipsis(sub: &Value, rest: &Value, form: &Value, literals: &[SymbolId]) -> bool {
    let rest_len = min_len(rest);
    let (elems, tail) = spine(form);
    if elems.len() < rest_len {
        return false;
    }
    let take = elems.len() - rest_len;
    if !elems[..take].iter().all(|elem| is_match(sub, elem, literals)) {
        return false;
    }
    let remainder = vec_to_improper(elems[take..].to_vec(), tail);
    is_match(rest, &remainder, literals)
}

/// A pattern variable's binding: a single form, or - under an ellipsis -
/// one sub-map per matched element (spec.md §4.3).
#[derive(Debug, Clone)]
pub enum MacroBinding {
    Scalar(Value),
    Sequence(Vec<MacroMap>),
}

#[derive(Debug, Clone, Default)]
pub struct MacroMap {
    bindings: HashMap<SymbolId, MacroBinding>,
}

impl MacroMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, sym: SymbolId, binding: MacroBinding) {
        self.bindings.insert(sym, binding);
    }

    pub fn get_scalar(&self, sym: SymbolId) -> Option<&Value> {
        match self.bindings.get(&sym) {
            Some(MacroBinding::Scalar(value)) => Some(value),
            _ => None,
        }
    }

    pub fn get_sequence(&self, sym: SymbolId) -> Option<&[MacroMap]> {
        match self.bindings.get(&sym) {
            Some(MacroBinding::Sequence(seq)) => Some(seq.as_slice()),
            _ => None,
        }
    }

    pub fn contains(&self, sym: SymbolId) -> bool {
        self.bindings.contains_key(&sym)
    }
}

fn pattern_vars(pattern: &Value, literals: &[SymbolId], out: &mut Vec<SymbolId>) {
    match pattern {
        Value::Symbol(sym) if *sym != SymbolId::ELLIPSIS && !literals.contains(sym) => {
            out.push(*sym)
        }
        Value::Pair(_) => {
            let (car, cdr) = pair_parts(pattern).expect("pattern is a pair");
            pattern_vars(&car, literals, out);
            pattern_vars(&cdr, literals, out);
        }
        _ => {}
    }
}

/// `parse(pattern, form, literals)` (spec.md §4.3): builds the
/// [`MacroMap`] that `is_match` already confirmed exists.
pub fn bind(pattern: &Value, form: &Value, literals: &[SymbolId], map: &mut MacroMap) {
    match pattern {
        Value::Symbol(sym) => {
            if !literals.contains(sym) && *sym != SymbolId::ELLIPSIS {
                map.insert(*sym, MacroBinding::Scalar(form.clone()));
            }
        }
        Value::Pair(_) => {
            let (car, cdr) = pair_parts(pattern).expect("pattern is a pair");
            if let Some((maybe_ellipsis, rest)) = pair_parts(&cdr) {
                if is_ellipsis(&maybe_ellipsis) {
                    bind_ellipsis(&car, &rest, form, literals, map);
                    return;
                }
            }
            if let Some((fcar, fcdr)) = pair_parts(form) {
                bind(&car, &fcar, literals, map);
                bind(&cdr, &fcdr, literals, map);
            }
        }
        _ => {}
    }
}

fn bind_ellipsis(sub: &Value, rest: &Value, form: &Value, literals: &[SymbolId], map: &mut MacroMap) {
    let rest_len = min_len(rest);
    let (elems, tail) = spine(form);
    let take = elems.len().saturating_sub(rest_len);

    let mut sub_maps = Vec::with_capacity(take);
    for elem in &elems[..take] {
        let mut sub_map = MacroMap::new();
        bind(sub, elem, literals, &mut sub_map);
        sub_maps.push(sub_map);
    }

    let mut vars = Vec::new();
    pattern_vars(sub, literals, &mut vars);
    for var in vars {
        map.insert(var, MacroBinding::Sequence(sub_maps.clone()));
    }

    let remainder = vec_to_improper(elems[take..].to_vec(), tail);
    bind(rest, &remainder, literals, map);
}

/// `transcribe(template, ...)` (spec.md §4.3). `def_scope` is the scope
/// saved at the macro's `define-syntax` site, used to annotate free
/// template identifiers for hygiene.
pub fn transcribe(template: &Value, map: &MacroMap, def_scope: &Handle<Scope>) -> Value {
    match template {
        Value::Symbol(sym) => match map.get_scalar(*sym) {
            Some(value) => value.clone(),
            None => {
                if *sym == SymbolId::ELLIPSIS {
                    template.clone()
                } else {
                    Value::Scoped(*sym, def_scope.clone())
                }
            }
        },
        Value::Pair(_) => {
            let (car, cdr) = pair_parts(template).expect("template is a pair");
            if let Some((maybe_ellipsis, rest)) = pair_parts(&cdr) {
                if is_ellipsis(&maybe_ellipsis) {
                    return transcribe_ellipsis(&car, &rest, map, def_scope);
                }
            }
            Value::cons(
                transcribe(&car, map, def_scope),
                transcribe(&cdr, map, def_scope),
            )
        }
        other => other.clone(),
    }
}

fn transcribe_ellipsis(sub: &Value, rest: &Value, map: &MacroMap, def_scope: &Handle<Scope>) -> Value {
    let mut vars = Vec::new();
    pattern_vars(sub, &[], &mut vars);

    let count = vars
        .iter()
        .find_map(|var| map.get_sequence(*var))
        .map(|seq| seq.len())
        .unwrap_or(0);

    let mut items = Vec::with_capacity(count);
    for i in 0..count {
        let mut sub_map = MacroMap::new();
        for var in &vars {
            if let Some(seq) = map.get_sequence(*var) {
                if let Some(scalar) = seq.get(i).and_then(|m| m.get_scalar(*var)) {
                    sub_map.insert(*var, MacroBinding::Scalar(scalar.clone()));
                }
            } else if let Some(scalar) = map.get_scalar(*var) {
                // Referenced outside its own ellipsis depth: reuse the
                // outer scalar binding unchanged for every replication.
                sub_map.insert(*var, MacroBinding::Scalar(scalar.clone()));
            }
        }
        items.push(transcribe(sub, &sub_map, def_scope));
    }

    let tail = transcribe(rest, map, def_scope);
    vec_to_improper(items, tail)
}

/// A single `define-syntax` binding: the literal identifiers and the
/// ordered list of (pattern, template) rules.
#[derive(Debug)]
pub struct SyntaxRules {
    pub literals: Vec<SymbolId>,
    pub rules: Vec<(Value, Value)>,
}

/// Parse a `(syntax-rules (LIT...) (PATTERN TEMPLATE)...)` form (the
/// cdr of `define-syntax`'s second operand).
pub fn parse_syntax_rules(form: &Value) -> Result<SyntaxRules> {
    let parts = list_to_vec(form)?;
    let (literals_form, rule_forms) = parts
        .split_first()
        .ok_or_else(|| Error::Compile("syntax-rules requires a literals list".to_string()))?;

    let literal_values = list_to_vec(literals_form)?;
    let mut literals = Vec::with_capacity(literal_values.len());
    for value in literal_values {
        literals.push(
            value
                .as_symbol()
                .ok_or_else(|| Error::Compile("syntax-rules literal must be a symbol".to_string()))?,
        );
    }

    let mut rules = Vec::with_capacity(rule_forms.len());
    for rule_form in rule_forms {
        let rule = list_to_vec(rule_form)?;
        if rule.len() != 2 {
            return Err(Error::Compile(
                "each syntax-rules rule must be a (pattern template) pair".to_string(),
            ));
        }
        rules.push((rule[0].clone(), rule[1].clone()));
    }

    Ok(SyntaxRules { literals, rules })
}

/// A macro table: the syntax-rules bindings visible from a compiling
/// procedure, inherited by reference from its parent (spec.md §4.1).
#[derive(Debug, Default)]
pub struct MacroTable {
    rules: HashMap<SymbolId, Rc<SyntaxRules>>,
}

impl MacroTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: SymbolId) -> Option<Rc<SyntaxRules>> {
        self.rules.get(&name).cloned()
    }

    /// Register a macro, returning `true` if this redefines an existing
    /// one (callers warn on redefinition per spec.md §7).
    pub fn define(&mut self, name: SymbolId, rules: SyntaxRules) -> bool {
        self.rules.insert(name, Rc::new(rules)).is_some()
    }
}

/// Expand a macro use `(NAME args...)` against `table`, trying each rule
/// in order; the first match wins (spec.md §4.3, §8 property 7).
pub fn expand(table: &MacroTable, name: SymbolId, use_form: &Value, def_scope: &Handle<Scope>) -> Result<Value> {
    let rules = table
        .get(name)
        .ok_or_else(|| Error::Compile(format!("no macro registered for symbol {name:?}")))?;

    let (_use_head, use_args) = pair_parts(use_form)
        .ok_or_else(|| Error::Compile("ill-formed macro use".to_string()))?;

    for (pattern, template) in &rules.rules {
        let (_pat_head, pat_args) = pair_parts(pattern)
            .ok_or_else(|| Error::Compile("ill-formed syntax-rules pattern".to_string()))?;

        if is_match(&pat_args, &use_args, &rules.literals) {
            let mut map = MacroMap::new();
            bind(&pat_args, &use_args, &rules.literals, &mut map);
            return Ok(transcribe(template, &map, def_scope));
        }
    }

    Err(Error::Compile(format!("no match for macro {name:?}")))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::symbol::SymbolTable;
    use num_bigint::BigInt;

    fn int(n: i64) -> Value {
        Value::Integer(BigInt::from(n))
    }

    fn list(values: Vec<Value>) -> Value {
        crate::utils::vec_to_list(values)
    }

    #[test]
    fn test_ellipsis_matches_and_binds_sequence() {
        let mut table = SymbolTable::new();
        let a = table.intern_symbol("a");

        let pattern = list(vec![Value::Symbol(a), Value::Symbol(SymbolId::ELLIPSIS)]);
        let form = list(vec![int(1), int(2), int(3)]);

        assert!(is_match(&pattern, &form, &[]));

        let mut map = MacroMap::new();
        bind(&pattern, &form, &[], &mut map);
        let seq = map.get_sequence(a).expect("a bound as a sequence");
        assert_eq!(seq.len(), 3);
        for (i, sub_map) in seq.iter().enumerate() {
            match sub_map.get_scalar(a) {
                Some(Value::Integer(n)) => assert_eq!(*n, BigInt::from(i as i64 + 1)),
                _ => panic!("expected scalar binding"),
            }
        }
    }

    #[test]
    fn test_dotted_pattern_matches_and_binds_rest() {
        let mut table = SymbolTable::new();
        let a = table.intern_symbol("a");
        let b = table.intern_symbol("b");

        let pattern = Value::cons(Value::Symbol(a), Value::Symbol(b));
        let form = list(vec![int(1), int(2), int(3)]);

        assert!(is_match(&pattern, &form, &[]));

        let mut map = MacroMap::new();
        bind(&pattern, &form, &[], &mut map);
        assert!(matches!(map.get_scalar(a), Some(Value::Integer(n)) if *n == BigInt::from(1)));

        let tail = map.get_scalar(b).expect("b bound");
        let elems = crate::utils::list_to_vec(tail).unwrap();
        assert_eq!(elems.len(), 2);
    }

    #[test]
    fn test_nested_ellipsis_let_pattern() {
        let mut table = SymbolTable::new();
        let a = table.intern_symbol("a");
        let b = table.intern_symbol("b");
        let body = table.intern_symbol("body");

        // (((a b) ...) body ...)
        let binding_pair = list(vec![Value::Symbol(a), Value::Symbol(b)]);
        let bindings = list(vec![binding_pair, Value::Symbol(SymbolId::ELLIPSIS)]);
        let pattern = list(vec![bindings, Value::Symbol(body), Value::Symbol(SymbolId::ELLIPSIS)]);

        // (((x 1) (y 2)) (+ 1 1) (+ 1 2))
        let x = table.intern_symbol("x");
        let y = table.intern_symbol("y");
        let plus = table.intern_symbol("+");
        let form = list(vec![
            list(vec![
                list(vec![Value::Symbol(x), int(1)]),
                list(vec![Value::Symbol(y), int(2)]),
            ]),
            list(vec![Value::Symbol(plus), int(1), int(1)]),
            list(vec![Value::Symbol(plus), int(1), int(2)]),
        ]);

        assert!(is_match(&pattern, &form, &[]));
    }

    #[test]
    fn test_transcribe_ellipsis_template() {
        let mut table = SymbolTable::new();
        let a = table.intern_symbol("a");

        let pattern = list(vec![Value::Symbol(a), Value::Symbol(SymbolId::ELLIPSIS)]);
        let form = list(vec![int(1), int(2), int(3)]);

        let mut map = MacroMap::new();
        bind(&pattern, &form, &[], &mut map);

        let template = list(vec![list(vec![
            Value::Symbol(a),
            Value::Symbol(SymbolId::ELLIPSIS),
        ])]);

        let def_scope = Scope::root();
        let expanded = transcribe(&template, &map, &def_scope);

        let outer = list_to_vec(&expanded).unwrap();
        assert_eq!(outer.len(), 1);
        let inner = list_to_vec(&outer[0]).unwrap();
        assert_eq!(inner.len(), 3);
    }
}

//! The callable half of the object model: native functions, user closures,
//! classes, and the instances classes construct.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::environment::{EnvRef, Environment};
use crate::error::RuntimeError;
use crate::interpreter::{Flow, IResult, Interpreter};
use crate::stmt::FunctionDecl;
use crate::token::Token;
use crate::value::Value;

pub const INITIALIZER: &str = "init";

/// Anything that can appear before `(...)`.  The interpreter checks the
/// argument count against `arity` before calling.
pub trait Callable {
    fn arity(&self) -> usize;

    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> IResult<Value>;
}

/// A host function exposed to scripts.
pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub func: fn(&[Value]) -> Value,
}

impl Callable for NativeFunction {
    fn arity(&self) -> usize {
        self.arity
    }

    fn call(&self, _interpreter: &mut Interpreter, arguments: Vec<Value>) -> IResult<Value> {
        debug!("Calling native function '{}'", self.name);
        Ok((self.func)(&arguments))
    }
}

/// A user function together with the scope it was declared in.
pub struct Function {
    declaration: Rc<FunctionDecl>,
    closure: EnvRef,
    is_initializer: bool,
}

impl Function {
    pub fn new(declaration: Rc<FunctionDecl>, closure: EnvRef, is_initializer: bool) -> Self {
        Function {
            declaration,
            closure,
            is_initializer,
        }
    }

    pub fn name(&self) -> &str {
        &self.declaration.name.lexeme
    }

    /// Copy of this method whose closure defines `this` as `instance`.  The
    /// original stays unbound.
    pub fn bind(&self, instance: Rc<RefCell<Instance>>) -> Function {
        let environment = Environment::child(&self.closure);
        environment
            .borrow_mut()
            .define("this", Value::Instance(instance));

        Function::new(
            Rc::clone(&self.declaration),
            environment,
            self.is_initializer,
        )
    }

    fn bound_this(&self) -> IResult<Value> {
        self.closure.borrow().lookup_at(0, "this").ok_or_else(|| {
            RuntimeError::new(&self.declaration.name, "Undefined variable 'this'.")
        })
    }
}

impl Callable for Function {
    fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> IResult<Value> {
        debug!("Calling user-defined function '{}'", self.name());

        let environment = Environment::child(&self.closure);
        {
            let mut scope = environment.borrow_mut();
            for (param, argument) in self.declaration.params.iter().zip(arguments) {
                scope.define(&param.lexeme, argument);
            }
        }

        let flow = interpreter.execute_block(&self.declaration.body, environment)?;

        if self.is_initializer {
            return self.bound_this();
        }

        Ok(match flow {
            Flow::Return(value) => value,
            Flow::Normal => Value::Nil,
        })
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}>", self.name())
    }
}

pub struct Class {
    pub name: String,
    superclass: Option<Rc<Class>>,
    methods: HashMap<String, Rc<Function>>,
}

impl Class {
    pub fn new(
        name: String,
        superclass: Option<Rc<Class>>,
        methods: HashMap<String, Rc<Function>>,
    ) -> Self {
        Class {
            name,
            superclass,
            methods,
        }
    }

    /// Nearest definition along the inheritance chain.
    pub fn find_method(&self, name: &str) -> Option<Rc<Function>> {
        match self.methods.get(name) {
            Some(method) => Some(Rc::clone(method)),
            None => self.superclass.as_ref()?.find_method(name),
        }
    }
}

impl Callable for Rc<Class> {
    fn arity(&self) -> usize {
        self.find_method(INITIALIZER).map_or(0, |init| init.arity())
    }

    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> IResult<Value> {
        debug!("Constructing instance of '{}'", self.name);

        let instance = Rc::new(RefCell::new(Instance::new(Rc::clone(self))));

        if let Some(initializer) = self.find_method(INITIALIZER) {
            initializer
                .bind(Rc::clone(&instance))
                .call(interpreter, arguments)?;
        }

        Ok(Value::Instance(instance))
    }
}

pub struct Instance {
    class: Rc<Class>,
    fields: HashMap<String, Value>,
}

impl Instance {
    pub fn new(class: Rc<Class>) -> Self {
        Instance {
            class,
            fields: HashMap::new(),
        }
    }

    pub fn class(&self) -> &Rc<Class> {
        &self.class
    }

    /// Field lookup first, then a method bound to `instance`.
    pub fn get(instance: &Rc<RefCell<Instance>>, name: &Token) -> IResult<Value> {
        let this = instance.borrow();

        if let Some(value) = this.fields.get(&name.lexeme) {
            return Ok(value.clone());
        }

        if let Some(method) = this.class.find_method(&name.lexeme) {
            return Ok(Value::Function(Rc::new(method.bind(Rc::clone(instance)))));
        }

        Err(RuntimeError::new(
            name,
            format!("Undefined property '{}'.", name.lexeme),
        ))
    }

    pub fn set(&mut self, name: &Token, value: Value) {
        self.fields.insert(name.lexeme.clone(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn method(name: &str, params: &[&str], closure: &EnvRef) -> Rc<Function> {
        let declaration = FunctionDecl {
            name: Token::identifier(name, 1),
            params: params.iter().map(|p| Token::identifier(*p, 1)).collect(),
            body: Vec::new(),
        };

        Rc::new(Function::new(
            Rc::new(declaration),
            Rc::clone(closure),
            name == INITIALIZER,
        ))
    }

    fn class(name: &str, superclass: Option<Rc<Class>>, methods: Vec<Rc<Function>>) -> Rc<Class> {
        let methods = methods
            .into_iter()
            .map(|m| (m.name().to_string(), m))
            .collect();
        Rc::new(Class::new(name.to_string(), superclass, methods))
    }

    #[test]
    fn method_lookup_prefers_the_nearest_class() {
        let globals: EnvRef = Rc::new(RefCell::new(Environment::new()));
        let base_speak = method("speak", &[], &globals);
        let base = class("Base", None, vec![Rc::clone(&base_speak), method("walk", &[], &globals)]);
        let derived_speak = method("speak", &["loud"], &globals);
        let derived = class("Derived", Some(base), vec![Rc::clone(&derived_speak)]);

        let found = derived.find_method("speak").unwrap();
        assert!(Rc::ptr_eq(&found, &derived_speak));
        assert_eq!(derived.find_method("walk").unwrap().name(), "walk");
        assert!(derived.find_method("fly").is_none());
    }

    #[test]
    fn class_arity_follows_inherited_initializer() {
        let globals: EnvRef = Rc::new(RefCell::new(Environment::new()));
        let base = class("Base", None, vec![method(INITIALIZER, &["a", "b"], &globals)]);
        let derived = class("Derived", Some(Rc::clone(&base)), Vec::new());
        let plain = class("Plain", None, Vec::new());

        assert_eq!(derived.arity(), 2);
        assert_eq!(plain.arity(), 0);
    }

    #[test]
    fn fields_shadow_methods() {
        let globals: EnvRef = Rc::new(RefCell::new(Environment::new()));
        let point = class("Point", None, vec![method("x", &[], &globals)]);
        let instance = Rc::new(RefCell::new(Instance::new(point)));
        let x = Token::identifier("x", 1);

        assert!(matches!(Instance::get(&instance, &x).unwrap(), Value::Function(_)));

        instance.borrow_mut().set(&x, Value::Number(4.0));
        assert_eq!(Instance::get(&instance, &x).unwrap(), Value::Number(4.0));

        let err = Instance::get(&instance, &Token::identifier("y", 2)).unwrap_err();
        assert_eq!(err.message, "Undefined property 'y'.");
        assert_eq!(err.line, 2);
    }

    #[test]
    fn binding_leaves_the_original_method_unbound() {
        let globals: EnvRef = Rc::new(RefCell::new(Environment::new()));
        let greet = method("greet", &[], &globals);
        let greeter = class("Greeter", None, vec![Rc::clone(&greet)]);
        let instance = Rc::new(RefCell::new(Instance::new(greeter)));

        let bound = greet.bind(Rc::clone(&instance));

        assert!(bound.closure.borrow().lookup_at(0, "this").is_some());
        assert!(greet.closure.borrow().lookup_at(0, "this").is_none());
    }
}

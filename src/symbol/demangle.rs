// Mon Oct 19 2026 - Alex

use crate::config::{AnalyzerConfig, DemanglerKind};
use crate::symbol::SymbolError;
use crate::utils::ProcessUtils;

/// Turns a batch of possibly-mangled names into display names, in order.
pub trait Demangler {
    fn demangle_batch(&self, names: &[String]) -> Result<Vec<String>, SymbolError>;
}

/// Pipes names through `c++filt -n` (or whatever command is configured).
pub struct CxxFiltDemangler {
    command: Vec<String>,
}

impl CxxFiltDemangler {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }
}

impl Default for CxxFiltDemangler {
    fn default() -> Self {
        Self::new(vec!["c++filt".to_string(), "-n".to_string()])
    }
}

impl Demangler for CxxFiltDemangler {
    fn demangle_batch(&self, names: &[String]) -> Result<Vec<String>, SymbolError> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let mut input = names.join("\n");
        input.push('\n');
        Ok(ProcessUtils::run_batch(&self.command, &input)?)
    }
}

pub struct BuiltinDemangler;

impl Demangler for BuiltinDemangler {
    fn demangle_batch(&self, names: &[String]) -> Result<Vec<String>, SymbolError> {
        Ok(names.iter().map(|name| try_demangle(name)).collect())
    }
}

pub struct NoopDemangler;

impl Demangler for NoopDemangler {
    fn demangle_batch(&self, names: &[String]) -> Result<Vec<String>, SymbolError> {
        Ok(names.to_vec())
    }
}

pub fn create_demangler(config: &AnalyzerConfig) -> Box<dyn Demangler> {
    match config.demangler {
        DemanglerKind::CxxFilt => Box::new(CxxFiltDemangler::new(config.demangler_command.clone())),
        DemanglerKind::Builtin => Box::new(BuiltinDemangler),
        DemanglerKind::None => Box::new(NoopDemangler),
    }
}

/// Never fails: names the demangler could not answer for come back unchanged.
pub fn demangle_or_raw(demangler: &dyn Demangler, names: &[String]) -> Vec<String> {
    let mut demangled = match demangler.demangle_batch(names) {
        Ok(demangled) => demangled,
        Err(e) => {
            log::warn!("demangling failed, showing raw names: {}", e);
            Vec::new()
        }
    };

    if demangled.len() < names.len() {
        if !demangled.is_empty() {
            log::warn!("demangler returned {} of {} names", demangled.len(), names.len());
        }
        demangled.extend(names[demangled.len()..].iter().cloned());
    }
    demangled.truncate(names.len());
    demangled
}

pub fn is_mangled(name: &str) -> bool {
    name.starts_with("_Z") || name.starts_with("__Z")
}

pub fn try_demangle(name: &str) -> String {
    if !is_mangled(name) {
        return name.to_string();
    }
    demangle(name).unwrap_or_else(|| name.to_string())
}

/// Itanium C++ ABI names only. Covers nested names, ctors/dtors, operators, the
/// common builtin and qualified parameter types, template arguments and
/// substitutions. Anything else yields `None`.
pub fn demangle(name: &str) -> Option<String> {
    let encoding = name.strip_prefix("__Z").or_else(|| name.strip_prefix("_Z"))?;
    let mut demangler = ItaniumDemangler::new(encoding);
    demangler.parse_encoding()
}

struct ParsedName {
    text: String,
    const_method: bool,
    has_template_args: bool,
    is_ctor_dtor: bool,
}

const MAX_TYPE_DEPTH: usize = 256;

struct ItaniumDemangler<'a> {
    input: &'a [u8],
    pos: usize,
    substitutions: Vec<String>,
    depth: usize,
}

impl<'a> ItaniumDemangler<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input: input.as_bytes(),
            pos: 0,
            substitutions: Vec::new(),
            depth: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    fn at_end(&self) -> bool {
        // GCC clone suffixes like ".isra.0" or ".constprop.1" end the encoding.
        self.pos >= self.input.len() || self.peek() == Some(b'.')
    }

    fn consume(&mut self, b: u8) -> bool {
        if self.peek() == Some(b) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse_encoding(&mut self) -> Option<String> {
        let name = self.parse_name()?;

        if self.at_end() {
            return Some(name.text);
        }

        // Template functions encode their return type first.
        if name.has_template_args && !name.is_ctor_dtor {
            self.parse_type()?;
        }

        let mut params = Vec::new();
        while !self.at_end() {
            params.push(self.parse_type()?);
        }

        let params = if params.len() == 1 && params[0] == "void" {
            String::new()
        } else {
            params.join(", ")
        };

        let suffix = if name.const_method { " const" } else { "" };
        Some(format!("{}({}){}", name.text, params, suffix))
    }

    fn parse_name(&mut self) -> Option<ParsedName> {
        match self.peek()? {
            b'N' => {
                self.pos += 1;
                self.parse_nested_name(false)
            }
            b'S' if self.peek_at(1) == Some(b't') => {
                self.pos += 2;
                let inner = self.parse_source_name()?;
                let mut text = format!("std::{}", inner);
                let has_template_args = self.peek() == Some(b'I');
                if has_template_args {
                    self.substitutions.push(text.clone());
                    text.push_str(&self.parse_template_args()?);
                }
                Some(ParsedName {
                    text,
                    const_method: false,
                    has_template_args,
                    is_ctor_dtor: false,
                })
            }
            b'0'..=b'9' => {
                let mut text = self.parse_source_name()?;
                let has_template_args = self.peek() == Some(b'I');
                if has_template_args {
                    self.substitutions.push(text.clone());
                    text.push_str(&self.parse_template_args()?);
                }
                Some(ParsedName {
                    text,
                    const_method: false,
                    has_template_args,
                    is_ctor_dtor: false,
                })
            }
            b'a'..=b'z' => Some(ParsedName {
                text: self.parse_operator_name()?,
                const_method: false,
                has_template_args: false,
                is_ctor_dtor: false,
            }),
            _ => None,
        }
    }

    fn parse_operator_name(&mut self) -> Option<String> {
        let code = [self.peek()?, self.peek_at(1)?];
        let op = operator_name(&code)?;
        self.pos += 2;
        Some(op.to_string())
    }

    /// Every prefix of a nested name is a substitution candidate. The full name
    /// only counts when it names a type, not the function being encoded.
    fn parse_nested_name(&mut self, is_type: bool) -> Option<ParsedName> {
        let mut const_method = false;
        loop {
            match self.peek()? {
                b'K' => const_method = true,
                b'V' | b'r' | b'R' | b'O' => {}
                _ => break,
            }
            self.pos += 1;
        }

        let mut components: Vec<String> = Vec::new();
        let mut pushed = 0usize;
        let mut has_template_args = false;
        let mut is_ctor_dtor = false;

        loop {
            let c = self.peek()?;

            match c {
                b'E' => {
                    self.pos += 1;
                    break;
                }
                b'S' => {
                    self.pos += 1;
                    let sub = self.parse_substitution()?;
                    components.clear();
                    components.push(sub);
                    has_template_args = false;
                    continue;
                }
                b'I' => {
                    let args = self.parse_template_args()?;
                    let last = components.last_mut()?;
                    last.push_str(&args);
                    has_template_args = true;
                }
                b'C' if matches!(self.peek_at(1), Some(b'1'..=b'5')) => {
                    self.pos += 2;
                    let class = base_name(components.last()?);
                    components.push(class);
                    has_template_args = false;
                    is_ctor_dtor = true;
                }
                b'D' if matches!(self.peek_at(1), Some(b'0'..=b'5')) => {
                    self.pos += 2;
                    let class = base_name(components.last()?);
                    components.push(format!("~{}", class));
                    has_template_args = false;
                    is_ctor_dtor = true;
                }
                b'0'..=b'9' => {
                    components.push(self.parse_source_name()?);
                    has_template_args = false;
                    is_ctor_dtor = false;
                }
                b'a'..=b'z' => {
                    components.push(self.parse_operator_name()?);
                    has_template_args = false;
                    is_ctor_dtor = false;
                }
                _ => return None,
            }

            self.substitutions.push(components.join("::"));
            pushed += 1;
        }

        if !is_type && pushed > 0 {
            self.substitutions.pop();
        }

        if components.is_empty() {
            return None;
        }

        Some(ParsedName {
            text: components.join("::"),
            const_method,
            has_template_args,
            is_ctor_dtor,
        })
    }

    fn parse_source_name(&mut self) -> Option<String> {
        let start = self.pos;
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.pos += 1;
        }

        let len: usize = std::str::from_utf8(&self.input[start..self.pos]).ok()?.parse().ok()?;
        let end = self.pos.checked_add(len)?;
        if end > self.input.len() {
            return None;
        }

        let name = std::str::from_utf8(&self.input[self.pos..end]).ok()?;
        self.pos = end;

        if name.starts_with("_GLOBAL__N") {
            Some("(anonymous namespace)".to_string())
        } else {
            Some(name.to_string())
        }
    }

    fn parse_substitution(&mut self) -> Option<String> {
        let c = self.peek()?;
        self.pos += 1;

        match c {
            b't' => {
                let name = format!("std::{}", self.parse_source_name()?);
                self.substitutions.push(name.clone());
                Some(name)
            }
            b'a' => Some("std::allocator".to_string()),
            b'b' => Some("std::basic_string".to_string()),
            b's' => Some("std::string".to_string()),
            b'i' => Some("std::istream".to_string()),
            b'o' => Some("std::ostream".to_string()),
            b'd' => Some("std::iostream".to_string()),
            b'_' => self.substitutions.first().cloned(),
            b'0'..=b'9' | b'A'..=b'Z' => {
                let mut index = base36_digit(c)?;
                loop {
                    let next = self.peek()?;
                    self.pos += 1;
                    if next == b'_' {
                        break;
                    }
                    index = index.checked_mul(36)?.checked_add(base36_digit(next)?)?;
                }
                self.substitutions.get(index.checked_add(1)?).cloned()
            }
            _ => None,
        }
    }

    fn parse_template_args(&mut self) -> Option<String> {
        if !self.consume(b'I') {
            return None;
        }

        let mut args = Vec::new();
        while !self.consume(b'E') {
            if self.consume(b'L') {
                // Literal: <type> <value> E
                self.parse_type()?;
                let start = self.pos;
                while self.peek()? != b'E' {
                    self.pos += 1;
                }
                let value = std::str::from_utf8(&self.input[start..self.pos]).ok()?;
                self.pos += 1;
                args.push(value.replacen('n', "-", 1));
            } else {
                args.push(self.parse_type()?);
            }
        }

        Some(format!("<{}>", args.join(", ")))
    }

    /// Every recursive path goes through here, so the depth cap bounds the stack.
    fn parse_type(&mut self) -> Option<String> {
        if self.depth >= MAX_TYPE_DEPTH {
            return None;
        }
        self.depth += 1;
        let ty = self.parse_type_inner();
        self.depth -= 1;
        ty
    }

    fn parse_type_inner(&mut self) -> Option<String> {
        let c = self.peek()?;

        if let Some(builtin) = builtin_type(c) {
            self.pos += 1;
            return Some(builtin.to_string());
        }

        let ty = match c {
            b'P' | b'R' | b'O' | b'K' | b'V' => {
                self.pos += 1;
                let inner = self.parse_type()?;
                match c {
                    b'P' => format!("{}*", inner),
                    b'R' => format!("{}&", inner),
                    b'O' => format!("{}&&", inner),
                    b'K' => format!("{} const", inner),
                    _ => format!("{} volatile", inner),
                }
            }
            b'N' => {
                self.pos += 1;
                // parse_nested_name already recorded the full type name.
                return Some(self.parse_nested_name(true)?.text);
            }
            b'S' => {
                self.pos += 1;
                let mut name = self.parse_substitution()?;
                if self.peek() != Some(b'I') {
                    return Some(name);
                }
                name.push_str(&self.parse_template_args()?);
                name
            }
            b'0'..=b'9' => {
                let mut name = self.parse_source_name()?;
                if self.peek() == Some(b'I') {
                    self.substitutions.push(name.clone());
                    name.push_str(&self.parse_template_args()?);
                }
                name
            }
            _ => return None,
        };

        self.substitutions.push(ty.clone());
        Some(ty)
    }
}

fn builtin_type(c: u8) -> Option<&'static str> {
    Some(match c {
        b'v' => "void",
        b'w' => "wchar_t",
        b'b' => "bool",
        b'c' => "char",
        b'a' => "signed char",
        b'h' => "unsigned char",
        b's' => "short",
        b't' => "unsigned short",
        b'i' => "int",
        b'j' => "unsigned int",
        b'l' => "long",
        b'm' => "unsigned long",
        b'x' => "long long",
        b'y' => "unsigned long long",
        b'n' => "__int128",
        b'o' => "unsigned __int128",
        b'f' => "float",
        b'd' => "double",
        b'e' => "long double",
        b'z' => "...",
        _ => return None,
    })
}

fn operator_name(code: &[u8; 2]) -> Option<&'static str> {
    Some(match code {
        b"nw" => "operator new",
        b"na" => "operator new[]",
        b"dl" => "operator delete",
        b"da" => "operator delete[]",
        b"pl" => "operator+",
        b"mi" => "operator-",
        b"ml" => "operator*",
        b"dv" => "operator/",
        b"rm" => "operator%",
        b"an" => "operator&",
        b"or" => "operator|",
        b"eo" => "operator^",
        b"aS" => "operator=",
        b"pL" => "operator+=",
        b"mI" => "operator-=",
        b"eq" => "operator==",
        b"ne" => "operator!=",
        b"lt" => "operator<",
        b"gt" => "operator>",
        b"le" => "operator<=",
        b"ge" => "operator>=",
        b"nt" => "operator!",
        b"ls" => "operator<<",
        b"rs" => "operator>>",
        b"pp" => "operator++",
        b"mm" => "operator--",
        b"pt" => "operator->",
        b"ix" => "operator[]",
        b"cl" => "operator()",
        _ => return None,
    })
}

fn base36_digit(c: u8) -> Option<usize> {
    match c {
        b'0'..=b'9' => Some((c - b'0') as usize),
        b'A'..=b'Z' => Some((c - b'A') as usize + 10),
        _ => None,
    }
}

/// `Foo<int>` -> `Foo`, for constructor and destructor names.
fn base_name(component: &str) -> String {
    match component.find('<') {
        Some(idx) => component[..idx].to_string(),
        None => component.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demangle_nested_method() {
        assert_eq!(demangle("_ZN7testing4Test3RunEv").as_deref(), Some("testing::Test::Run()"));
    }

    #[test]
    fn test_demangle_free_function_params() {
        assert_eq!(demangle("_Z3fooPKci").as_deref(), Some("foo(char const*, int)"));
    }

    #[test]
    fn test_demangle_ctor_dtor_and_const() {
        assert_eq!(
            demangle("_ZN4base8internal8RunnableC2Ev").as_deref(),
            Some("base::internal::Runnable::Runnable()")
        );
        assert_eq!(demangle("_ZN3FooD1Ev").as_deref(), Some("Foo::~Foo()"));
        assert_eq!(demangle("_ZNK3Foo3getEv").as_deref(), Some("Foo::get() const"));
    }

    #[test]
    fn test_demangle_substitution() {
        assert_eq!(demangle("_ZN5Outer5innerEPS_").as_deref(), Some("Outer::inner(Outer*)"));
        assert_eq!(
            demangle("_ZN4base6Thread5StartERKSs").as_deref(),
            Some("base::Thread::Start(std::string const&)")
        );
    }

    #[test]
    fn test_demangle_allocation_operators() {
        assert_eq!(demangle("_Znwm").as_deref(), Some("operator new(unsigned long)"));
        assert_eq!(demangle("_Znam").as_deref(), Some("operator new[](unsigned long)"));
        assert_eq!(demangle("_ZdlPv").as_deref(), Some("operator delete(void*)"));
        assert_eq!(demangle("_ZdaPv").as_deref(), Some("operator delete[](void*)"));
    }

    #[test]
    fn test_demangle_member_operator() {
        assert_eq!(demangle("_ZN3FooplERKS_").as_deref(), Some("Foo::operator+(Foo const&)"));
        assert_eq!(demangle("_ZN3FooixEm").as_deref(), Some("Foo::operator[](unsigned long)"));
    }

    #[test]
    fn test_hostile_input_is_rejected() {
        assert_eq!(demangle("_ZN3FooS3W5E11264SGSF_E"), None);
        assert_eq!(demangle("_ZN3FooSZZZZZZZZZZZZZZZZZZZZZZZZZ_E"), None);

        let deep = format!("_Z1f{}i", "P".repeat(200_000));
        assert_eq!(demangle(&deep), None);
        assert_eq!(try_demangle(&deep), deep);
    }

    #[test]
    fn test_unmangled_names_pass_through() {
        assert_eq!(demangle("malloc"), None);
        assert_eq!(try_demangle("malloc"), "malloc");
        assert_eq!(try_demangle("0x4C2B0E0"), "0x4C2B0E0");
        assert!(!is_mangled("start_thread"));
    }

    #[test]
    fn test_demangle_or_raw_pads_short_output() {
        struct HalfDemangler;
        impl Demangler for HalfDemangler {
            fn demangle_batch(&self, names: &[String]) -> Result<Vec<String>, SymbolError> {
                Ok(names.iter().take(1).map(|n| format!("<{}>", n)).collect())
            }
        }

        let names = vec!["a".to_string(), "b".to_string()];
        assert_eq!(demangle_or_raw(&HalfDemangler, &names), vec!["<a>", "b"]);
    }

    #[test]
    fn test_demangle_or_raw_on_failure() {
        let demangler = CxxFiltDemangler::new(vec!["missing-cxxfilt-7781".to_string()]);
        let names = vec!["_ZN3FooD1Ev".to_string(), "0x1234".to_string()];
        assert_eq!(demangle_or_raw(&demangler, &names), names);
    }

    #[cfg(unix)]
    #[test]
    fn test_external_filter_keeps_order() {
        let demangler = CxxFiltDemangler::new(vec!["cat".to_string()]);
        let names = vec!["first".to_string(), "second".to_string()];
        assert_eq!(demangler.demangle_batch(&names).unwrap(), names);
    }
}

//! Path dialect used by [`XmlDocument`](super::XmlDocument)
//!
//! Supported syntax:
//! - `/`-separated steps; a leading `/` starts at the document root
//! - `//` selects descendants
//! - `.`, `..`, `*` and element names (namespace prefixes are ignored)
//! - predicates: `[2]`, `[@a]`, `[@a='v']`, `[@a!='v']`, `[@a=$var]`,
//!   `[rel/path]`, `[rel/path/@a='v']`, combined with ` and `

/// Parsed path
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedPath {
    pub absolute: bool,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    /// `//` in front of the step
    pub descendant: bool,
    pub test: NodeTest,
    pub predicates: Vec<Predicate>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeTest {
    SelfNode,
    Parent,
    Any,
    /// Local name, prefix stripped
    Name(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// 1-based position among the nodes selected from one context node
    Position(usize),
    /// All conditions must hold
    Conditions(Vec<Condition>),
}

/// `rel/path/@attr op operand`, or an existence test when `comparison` is `None`
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub steps: Vec<Step>,
    pub attribute: Option<String>,
    pub comparison: Option<(Comparison, Operand)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Ne,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Literal(String),
    /// `$name`, resolved from the caller's bindings
    Variable(String),
}

/// Parse a path expression
pub fn parse_path(path: &str) -> Result<ParsedPath, String> {
    let path = path.trim();
    if path.is_empty() {
        return Ok(ParsedPath {
            absolute: false,
            steps: vec![],
        });
    }

    let absolute = path.starts_with('/') && !path.starts_with("//");
    let steps = parse_steps(if absolute { &path[1..] } else { path })?;
    Ok(ParsedPath { absolute, steps })
}

fn parse_steps(path: &str) -> Result<Vec<Step>, String> {
    let mut steps = Vec::new();
    let mut descendant = false;

    for (raw, slash_count) in split_steps(path)? {
        if slash_count > 1 {
            descendant = true;
        }
        if raw.is_empty() {
            continue;
        }
        steps.push(parse_step(&raw, descendant)?);
        descendant = false;
    }

    if descendant {
        return Err(format!("path '{}' ends with '//'", path));
    }
    Ok(steps)
}

/// Split on `/` outside brackets and quotes. Each item carries the number of
/// slashes that preceded it.
fn split_steps(path: &str) -> Result<Vec<(String, usize)>, String> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut slashes = 0;
    let mut depth = 0usize;
    let mut quote: Option<char> = None;

    for c in path.chars() {
        if let Some(q) = quote {
            current.push(c);
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => {
                quote = Some(c);
                current.push(c);
            }
            '[' => {
                depth += 1;
                current.push(c);
            }
            ']' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| format!("unbalanced ']' in '{}'", path))?;
                current.push(c);
            }
            '/' if depth == 0 => {
                if !current.is_empty() {
                    items.push((std::mem::take(&mut current), slashes));
                    slashes = 0;
                }
                slashes += 1;
            }
            _ => current.push(c),
        }
    }

    if depth != 0 || quote.is_some() {
        return Err(format!("unbalanced predicate in '{}'", path));
    }
    if !current.is_empty() {
        items.push((current, slashes));
    } else if slashes > 0 {
        items.push((String::new(), slashes));
    }
    Ok(items)
}

fn parse_step(raw: &str, descendant: bool) -> Result<Step, String> {
    let (name, rest) = match raw.find('[') {
        Some(pos) => (raw[..pos].trim(), &raw[pos..]),
        None => (raw.trim(), ""),
    };

    let test = match name {
        "." => NodeTest::SelfNode,
        ".." => NodeTest::Parent,
        "*" => NodeTest::Any,
        n if n.starts_with('@') => {
            return Err(format!("attribute step '{}' cannot select a node", n));
        }
        n if n.is_empty() => return Err(format!("missing node test in '{}'", raw)),
        n => NodeTest::Name(local_name(n).to_string()),
    };

    let predicates = split_predicates(rest)?
        .iter()
        .map(|p| parse_predicate(p))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Step {
        descendant,
        test,
        predicates,
    })
}

/// `[a][b]` -> `["a", "b"]`
fn split_predicates(rest: &str) -> Result<Vec<String>, String> {
    let mut predicates = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;

    for c in rest.chars() {
        if let Some(q) = quote {
            current.push(c);
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => {
                quote = Some(c);
                current.push(c);
            }
            '[' => {
                if depth > 0 {
                    current.push(c);
                }
                depth += 1;
            }
            ']' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| format!("unbalanced ']' in '{}'", rest))?;
                if depth == 0 {
                    predicates.push(std::mem::take(&mut current));
                } else {
                    current.push(c);
                }
            }
            c if depth == 0 && !c.is_whitespace() => {
                return Err(format!("unexpected '{}' after predicate in '{}'", c, rest));
            }
            _ => {
                if depth > 0 {
                    current.push(c);
                }
            }
        }
    }
    Ok(predicates)
}

fn parse_predicate(raw: &str) -> Result<Predicate, String> {
    let raw = raw.trim();
    if !raw.is_empty() && raw.chars().all(|c| c.is_ascii_digit()) {
        let position = raw
            .parse::<usize>()
            .map_err(|e| format!("bad position '{}': {}", raw, e))?;
        if position == 0 {
            return Err("positions start at 1".to_string());
        }
        return Ok(Predicate::Position(position));
    }

    split_outside_quotes(raw, " and ")
        .into_iter()
        .map(|c| parse_condition(c.trim()))
        .collect::<Result<Vec<_>, _>>()
        .map(Predicate::Conditions)
}

fn parse_condition(raw: &str) -> Result<Condition, String> {
    if raw.is_empty() {
        return Err("empty predicate".to_string());
    }

    let (lhs, comparison) = match find_outside_quotes(raw, "!=") {
        Some(pos) => (&raw[..pos], Some((Comparison::Ne, &raw[pos + 2..]))),
        None => match find_outside_quotes(raw, "=") {
            Some(pos) => (&raw[..pos], Some((Comparison::Eq, &raw[pos + 1..]))),
            None => (raw, None),
        },
    };

    let comparison = match comparison {
        Some((op, rhs)) => Some((op, parse_operand(rhs.trim())?)),
        None => None,
    };

    let lhs = lhs.trim();
    let (path_part, attribute) = match lhs.rfind('@') {
        Some(pos) => {
            let path_part = lhs[..pos].trim_end_matches('/');
            (path_part, Some(lhs[pos + 1..].trim().to_string()))
        }
        None => (lhs, None),
    };

    let steps = if path_part.is_empty() {
        vec![]
    } else {
        parse_steps(path_part)?
    };

    if attribute.is_none() && comparison.is_some() {
        return Err(format!("comparison in '{}' needs an attribute", raw));
    }

    Ok(Condition {
        steps,
        attribute,
        comparison,
    })
}

fn parse_operand(raw: &str) -> Result<Operand, String> {
    if let Some(name) = raw.strip_prefix('$') {
        if name.is_empty() {
            return Err("empty variable reference".to_string());
        }
        return Ok(Operand::Variable(name.to_string()));
    }
    for q in ['\'', '"'] {
        if raw.len() >= 2 && raw.starts_with(q) && raw.ends_with(q) {
            return Ok(Operand::Literal(raw[1..raw.len() - 1].to_string()));
        }
    }
    Err(format!("operand '{}' must be quoted or a $variable", raw))
}

fn find_outside_quotes(haystack: &str, needle: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, c) in haystack.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '\'' || c == '"' => quote = Some(c),
            None if haystack[i..].starts_with(needle) => return Some(i),
            None => {}
        }
    }
    None
}

fn split_outside_quotes<'a>(haystack: &'a str, separator: &str) -> Vec<&'a str> {
    let mut parts = Vec::new();
    let mut rest = haystack;
    while let Some(pos) = find_outside_quotes(rest, separator) {
        parts.push(&rest[..pos]);
        rest = &rest[pos + separator.len()..];
    }
    parts.push(rest);
    parts
}

/// `cda:code` -> `code`
pub fn local_name(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}

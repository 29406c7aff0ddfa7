//! attr-template CLI
//!
//! Usage:
//!   attr-template [OPTIONS] parse <REF>
//!   attr-template [OPTIONS] resolve <REF> --fixture <FILE>
//!   attr-template [OPTIONS] cast <VALUE> --type <TYPE>
//!
//! Options:
//!   -d, --dictionary <FILE>  Attribute catalogue (TOML format)
//!   -c, --config <FILE>      Engine configuration (TOML format)
//!   -l, --list <LIST>        Default list for unqualified references
//!   -r, --request <REQUEST>  Default request for unqualified references
//!   -g, --grammar            Show reference grammar
//!   -h, --help               Print help
//!
//! Set ATTR_TEMPLATE_LOG (for example `ATTR_TEMPLATE_LOG=debug`) to log to stderr.

use std::fmt::Display;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use attr_template::request::{PacketCode, RequestFixture};
use attr_template::template::{AttrDescriptor, Instance, Tag};
use attr_template::{
    parse_with_config, Catalogue, EngineConfig, ListKind, NoExpansion, Request, RequestRef,
    Template, TemplateKind, ValueType,
};

#[derive(Parser)]
#[command(name = "attr-template")]
#[command(about = "Parse, resolve and cast RADIUS attribute references")]
struct Cli {
    /// Attribute catalogue (TOML format); the built-in catalogue otherwise
    #[arg(short, long, global = true)]
    dictionary: Option<PathBuf>,

    /// Engine configuration (TOML format)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Default list for references without a list qualifier
    #[arg(short, long, global = true)]
    list: Option<String>,

    /// Default request for references without a request qualifier
    #[arg(short, long, global = true)]
    request: Option<String>,

    /// Show reference grammar
    #[arg(short, long)]
    grammar: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a reference and describe the template
    Parse {
        reference: String,
    },
    /// Resolve a reference against a request fixture
    Resolve {
        reference: String,

        /// Request fixture (TOML format)
        #[arg(short, long)]
        fixture: PathBuf,
    },
    /// Cast a value to a data type
    Cast {
        value: String,

        /// Target type, such as integer or ipaddr
        #[arg(short = 't', long = "type")]
        ty: String,

        /// Request fixture used when the value has to be expanded
        #[arg(short, long)]
        fixture: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_env("ATTR_TEMPLATE_LOG"))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if cli.grammar {
        print_grammar();
        return;
    }

    let Some(command) = &cli.command else {
        print_grammar();
        return;
    };

    let catalogue = match &cli.dictionary {
        Some(path) => Catalogue::from_file(path)
            .unwrap_or_else(|e| fail(format!("Error loading dictionary '{}'", path.display()), e)),
        None => Catalogue::builtin(),
    };
    let config = load_config(&cli);

    match command {
        Command::Parse { reference } => run_parse(reference, &catalogue, &config),
        Command::Resolve { reference, fixture } => {
            run_resolve(reference, fixture, &catalogue, &config)
        }
        Command::Cast { value, ty, fixture } => {
            run_cast(value, ty, fixture.as_deref(), &catalogue, &config)
        }
    }
}

fn fail(context: impl Display, err: impl Display) -> ! {
    eprintln!("{}: {}", context, err);
    std::process::exit(1);
}

fn load_config(cli: &Cli) -> EngineConfig {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)
            .unwrap_or_else(|e| fail(format!("Error loading config '{}'", path.display()), e)),
        None => EngineConfig::default(),
    };
    if let Some(name) = &cli.list {
        let list = ListKind::from_name(name)
            .unwrap_or_else(|| fail("Error", format!("unknown list '{}'", name)));
        config = config.with_list(list);
    }
    if let Some(name) = &cli.request {
        let request = RequestRef::from_name(name)
            .unwrap_or_else(|| fail("Error", format!("unknown request qualifier '{}'", name)));
        config = config.with_request(request);
    }
    config
}

fn parse_or_exit<'a>(
    reference: &'a str,
    catalogue: &Catalogue,
    config: &EngineConfig,
) -> Template<'a> {
    match parse_with_config(reference, catalogue, config) {
        Ok(tmpl) => tmpl,
        Err(e) => {
            eprint!("{}", e.format(reference, "reference"));
            std::process::exit(1);
        }
    }
}

fn load_fixture(path: &Path, catalogue: &Catalogue) -> (RequestFixture, Option<Request<'static>>) {
    let fixture = RequestFixture::from_file(path)
        .unwrap_or_else(|e| fail(format!("Error loading fixture '{}'", path.display()), e));
    let parent = fixture
        .parent()
        .map(|p| p.build(catalogue))
        .transpose()
        .unwrap_or_else(|e| fail(format!("Error building fixture '{}'", path.display()), e));
    (fixture, parent)
}

fn run_parse(reference: &str, catalogue: &Catalogue, config: &EngineConfig) {
    let tmpl = parse_or_exit(reference, catalogue, config);

    println!("kind:      {}", tmpl.kind.name());
    match &tmpl.kind {
        TemplateKind::Attribute(attr) => {
            println!("request:   {}", attr.request);
            println!("list:      {}", attr.list);
            println!("attribute: {}", attr.da.name);
            println!("number:    {} (vendor {})", attr.da.attr, attr.da.vendor);
            println!("type:      {}", attr.da.ty);
            if let AttrDescriptor::Unknown(_) = attr.da {
                println!("unknown:   yes");
            }
            match attr.tag {
                Tag::Any => println!("tag:       any"),
                Tag::Value(tag) => println!("tag:       {}", tag),
            }
            println!("instance:  {}", describe_instance(attr.num));
        }
        TemplateKind::UnknownAttribute(unknown) => {
            println!("request:   {}", unknown.request);
            println!("list:      {}", unknown.list);
            println!("attribute: {}", unknown.name);
            println!("instance:  {}", describe_instance(unknown.num));
        }
        TemplateKind::List(list) => {
            println!("request:   {}", list.request);
            println!("list:      {}", list.list);
        }
        _ => {}
    }
    println!("canonical: {}", tmpl);

    if config.verify {
        match tmpl.check_with(catalogue) {
            Ok(()) => println!("verify:    ok"),
            Err(fault) => fail("Consistency check failed", fault),
        }
    }
}

fn describe_instance(num: Instance) -> String {
    match num {
        Instance::Any => "any".to_string(),
        Instance::All => "all".to_string(),
        Instance::Index(n) => n.to_string(),
    }
}

fn run_resolve(reference: &str, fixture: &Path, catalogue: &Catalogue, config: &EngineConfig) {
    let tmpl = parse_or_exit(reference, catalogue, config);
    let (fixture_def, parent) = load_fixture(fixture, catalogue);
    let mut request = fixture_def
        .build(catalogue)
        .unwrap_or_else(|e| fail(format!("Error building fixture '{}'", fixture.display()), e));
    if let Some(parent) = &parent {
        request.set_parent(parent);
    }

    match tmpl.cursor(&request) {
        Ok(cursor) => {
            for pair in cursor {
                println!("{}", pair);
            }
        }
        Err(e) => fail(format!("Error resolving '{}' ({})", reference, e.code()), e),
    }
}

fn run_cast(
    value: &str,
    ty: &str,
    fixture: Option<&Path>,
    catalogue: &Catalogue,
    config: &EngineConfig,
) {
    let ty: ValueType = ty.parse().unwrap_or_else(|e| fail("Error", e));
    let (request_ref, list) = (config.default_request, config.default_list);
    let mut tmpl = Template::from_token(value, catalogue, request_ref, list).unwrap_or_else(|e| {
        eprint!("{}", e.format(value, "value"));
        std::process::exit(1);
    });

    if tmpl.is_literal() {
        match tmpl.cast_in_place(ty) {
            Ok(()) => println!("{}", tmpl),
            Err(e) => fail(format!("Error casting '{}'", value), e),
        }
        return;
    }

    let (mut request, parent) = match fixture {
        Some(path) => {
            let (fixture_def, parent) = load_fixture(path, catalogue);
            let request = fixture_def.build(catalogue).unwrap_or_else(|e| {
                fail(format!("Error building fixture '{}'", path.display()), e)
            });
            (request, parent)
        }
        None => (Request::new(PacketCode::AccessRequest), None),
    };
    if let Some(parent) = &parent {
        request.set_parent(parent);
    }

    match tmpl.cast_to_value(ty, &request, &NoExpansion) {
        Ok(value) => println!("{}", Template::data(value)),
        Err(e) => fail(format!("Error casting '{}'", value), e),
    }
}

fn print_grammar() {
    println!(
        r#"ATTRIBUTE REFERENCE GRAMMAR
===========================

    [&] [<request>.] [<list>:] <attribute> [:<tag>] [[<index>]]

REQUESTS
--------
current      The request being processed (default)
parent       The request this one was spawned from
outer        Same as parent

LISTS
-----
request, reply, control (config), proxy-request, proxy-reply,
coa, coa-reply, disconnect, disconnect-reply

SUFFIXES
--------
:<tag>       Tag 0-31, only for attributes that carry tags
[<index>]    Instance 0-1000, counting matches from zero
[*]          Every instance

EXAMPLES
--------
&User-Name                      First User-Name in the request
&reply:Tunnel-Type:1            Tunnel-Type with tag 1 in the reply
&outer.control:Auth-Type        Auth-Type in the parent's control list
&Attr-26.9.1[*]                 Every instance of vendor 9 attribute 1
&reply:                         The whole reply list

VALUES
------
bare   'literal'   "expanded %{{...}}"   `command`   /regex/i"#
    );
}

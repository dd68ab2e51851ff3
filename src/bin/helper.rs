//! exec.d helper. The buildpack installs this binary once per helper name and
//! the name it is invoked under selects what it contributes to the launch
//! environment.

use std::{collections::HashMap, env, num::NonZeroUsize, path::Path, thread};

use libcnb::{
    Env,
    data::{exec_d::ExecDProgramOutputKey, exec_d_program_output_key},
    exec_d::write_exec_d_program_output,
};

const DEFAULT_JMX_PORT: &str = "5000";
const DEFAULT_NMT_LEVEL: &str = "summary";

fn main() {
    let name = env::args_os()
        .next()
        .as_deref()
        .map(Path::new)
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let processors = thread::available_parallelism().map_or(1, NonZeroUsize::get);

    let output = helper_output(&name, &Env::from_current(), processors).unwrap_or_else(|| {
        eprintln!("Warning: Unknown helper '{name}', contributing nothing");
        HashMap::new()
    });
    write_exec_d_program_output(output);
}

/// Launch variables for the helper called `name`. `None` for an unknown helper.
fn helper_output(
    name: &str,
    env: &Env,
    processors: usize,
) -> Option<HashMap<ExecDProgramOutputKey, String>> {
    let tool_options = match name {
        "active-processor-count" => active_processor_count(env, processors),
        "java-opts" => java_opts(env),
        "jmx" => jmx(env),
        "nmt" => nmt(env),
        _ => return None,
    };

    Some(
        tool_options
            .map(|options| HashMap::from([(exec_d_program_output_key!("JAVA_TOOL_OPTIONS"), options)]))
            .unwrap_or_default(),
    )
}

fn var(env: &Env, name: &str) -> Option<String> {
    env.get(name)
        .map(|value| value.to_string_lossy().trim().to_string())
        .filter(|value| !value.is_empty())
}

fn enabled(env: &Env, name: &str, default: bool) -> bool {
    var(env, name).map_or(default, |value| {
        matches!(value.to_ascii_lowercase().as_str(), "true" | "1" | "yes")
    })
}

fn with_tool_options(env: &Env, options: &str) -> String {
    match var(env, "JAVA_TOOL_OPTIONS") {
        Some(existing) => format!("{existing} {options}"),
        None => options.to_string(),
    }
}

fn configured(env: &Env, flag: &str) -> bool {
    var(env, "JAVA_TOOL_OPTIONS").is_some_and(|options| options.contains(flag))
}

fn active_processor_count(env: &Env, processors: usize) -> Option<String> {
    if configured(env, "-XX:ActiveProcessorCount") {
        return None;
    }
    Some(with_tool_options(
        env,
        &format!("-XX:ActiveProcessorCount={processors}"),
    ))
}

fn java_opts(env: &Env) -> Option<String> {
    var(env, "JAVA_OPTS").map(|options| with_tool_options(env, &options))
}

fn jmx(env: &Env) -> Option<String> {
    if !enabled(env, "BPL_JMX_ENABLED", false) {
        return None;
    }
    let port = var(env, "BPL_JMX_PORT").unwrap_or_else(|| DEFAULT_JMX_PORT.to_string());
    Some(with_tool_options(
        env,
        &format!(
            "-Djava.rmi.server.hostname=127.0.0.1 \
             -Dcom.sun.management.jmxremote.authenticate=false \
             -Dcom.sun.management.jmxremote.ssl=false \
             -Dcom.sun.management.jmxremote.port={port} \
             -Dcom.sun.management.jmxremote.rmi.port={port}"
        ),
    ))
}

fn nmt(env: &Env) -> Option<String> {
    if !enabled(env, "BPL_JAVA_NMT_ENABLED", true) || configured(env, "-XX:NativeMemoryTracking") {
        return None;
    }
    let level = var(env, "BPL_JAVA_NMT_LEVEL").unwrap_or_else(|| DEFAULT_NMT_LEVEL.to_string());
    Some(with_tool_options(
        env,
        &format!(
            "-XX:+UnlockDiagnosticVMOptions -XX:NativeMemoryTracking={level} -XX:+PrintNMTStatistics"
        ),
    ))
}

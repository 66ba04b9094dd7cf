use clap::{Arg, App};
use log::info;

use std::error::Error;
use std::io::{self, Write};

use lpr_template::{run, Recognizer, RecognizerOptions};
use lpr_template::loader::DecodePolicy;
use lpr_template::matcher::MatchMethod;
use lpr_template::preprocess::PreprocessConfig;


fn main() -> Result<(), Box<dyn Error>>{
    env_logger::init();

    let matches = App::new("LPR template matching")
                    .version("0.1.0")
                    .author("kingrong")
                    .about("Recognize segmented license plate characters against a template set")
                    .arg(Arg::with_name("TEMPLATES")
                        .help("directory of template images, one sub directory per character")
                        .required(true)
                        .index(1))
                    .arg(Arg::with_name("TESTS")
                        .help("directory of test images named like `plate_word<N>.png`")
                        .required(true)
                        .index(2))
                    .arg(Arg::with_name("method")
                        .long("method")
                        .takes_value(true)
                        .possible_values(&["ccoeff-normed", "ccorr-normed"])
                        .default_value("ccoeff-normed")
                        .help("similarity measure"))
                    .arg(Arg::with_name("top")
                        .long("top")
                        .takes_value(true)
                        .default_value("5")
                        .help("number of candidates reported per image"))
                    .arg(Arg::with_name("blur")
                        .long("blur")
                        .takes_value(true)
                        .default_value("5")
                        .help("gaussian blur kernel size"))
                    .arg(Arg::with_name("block")
                        .long("block")
                        .takes_value(true)
                        .default_value("11")
                        .help("adaptive threshold block size"))
                    .arg(Arg::with_name("offset")
                        .long("offset")
                        .takes_value(true)
                        .default_value("2")
                        .allow_hyphen_values(true)
                        .help("constant subtracted from the local mean"))
                    .arg(Arg::with_name("strict")
                        .long("strict")
                        .help("abort on files that are not decodable images instead of skipping them"))
                    .arg(Arg::with_name("summary")
                        .long("summary")
                        .help("print accuracy and timing totals after the report"))
                    .get_matches();

    let template_dir = matches.value_of("TEMPLATES").ok_or("template directory is required")?;
    let test_dir = matches.value_of("TESTS").ok_or("test directory is required")?;
    let options = RecognizerOptions {
        preprocess: PreprocessConfig {
            blur_kernel: matches.value_of("blur").unwrap_or("5").parse()?,
            block_size: matches.value_of("block").unwrap_or("11").parse()?,
            offset: matches.value_of("offset").unwrap_or("2").parse()?,
        },
        method: matches.value_of("method").unwrap_or("ccoeff-normed").parse::<MatchMethod>()?,
        top_k: matches.value_of("top").unwrap_or("5").parse()?,
    };
    let policy = if matches.is_present("strict") { DecodePolicy::Abort } else { DecodePolicy::Skip };

    let recognizer = Recognizer::from_dir(template_dir, options, policy)?;
    info!("matching with {}", options.method);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let summary = run(&recognizer, test_dir, policy, &mut out)?;
    if matches.is_present("summary") {
        writeln!(out, "{}", summary)?;
    }
    out.flush()?;

    if summary.failed > 0 {
        return Err(format!("{} test images could not be recognized", summary.failed).into());
    }
    Ok(())
}

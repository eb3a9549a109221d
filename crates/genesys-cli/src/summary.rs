use console::Style;
use genesys_core::device::Device;
use genesys_core::session::ScanSession;
use genesys_core::settings::Settings;

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    method: Style,
    disabled: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            disabled: Style::new().dim().yellow(),
        }
    }
}

pub fn print_session_summary(dev: &Device, settings: &Settings, session: &ScanSession) {
    let s = Styles::new();
    let model = &dev.model;

    println!();
    println!(
        "  {}",
        s.title.apply_to(format!("{} {}", model.vendor, model.model))
    );
    println!("  {}", s.title.apply_to("\u{2550}".repeat(16)));
    println!();

    println!(
        "  {:<14}{}",
        s.label.apply_to("ASIC"),
        s.method.apply_to(model.asic_type)
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Sensor"),
        s.value.apply_to(if model.is_cis { "CIS" } else { "CCD" })
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Method"),
        s.method.apply_to(settings.scan_method)
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Mode"),
        s.method.apply_to(settings.scan_mode)
    );
    println!();

    println!("  {}", s.header.apply_to("Request"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Resolution"),
        s.value.apply_to(format!("{} x {} dpi", settings.xres, settings.yres))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Size"),
        s.value.apply_to(format!("{} x {} px", settings.pixels, settings.lines))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Depth"),
        s.value.apply_to(format!("{} bit", settings.depth))
    );
    println!();

    println!("  {}", s.header.apply_to("Session"));
    if !session.computed {
        println!("    {}", s.disabled.apply_to("not computed"));
        println!();
        return;
    }
    println!(
        "    {:<12}{}",
        s.label.apply_to("Optical"),
        s.value.apply_to(format!(
            "{} dpi, {} px",
            session.optical_resolution, session.optical_pixels
        ))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Output"),
        s.value.apply_to(format!(
            "{} px, {} bytes/line",
            session.output_pixels, session.output_line_bytes
        ))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Lines"),
        s.value.apply_to(format!(
            "{} optical, {} output",
            session.optical_line_count, session.output_line_count
        ))
    );
    if session.segment_count > 1 {
        println!(
            "    {:<12}{}",
            s.label.apply_to("Segments"),
            s.value.apply_to(session.segment_count)
        );
    }
    if session.max_color_shift_lines > 0 || session.num_staggered_lines > 0 {
        println!(
            "    {:<12}{}",
            s.label.apply_to("Shift"),
            s.value.apply_to(format!(
                "{} colour, {} stagger lines",
                session.max_color_shift_lines, session.num_staggered_lines
            ))
        );
    }
    println!(
        "    {:<12}{}",
        s.label.apply_to("Flags"),
        s.value.apply_to(session.params.flags)
    );
    println!();
}

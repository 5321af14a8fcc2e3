//! Built-in HTML sheet templates.
//!
//! Templates produce the sheet body only; `crate::assemble_html` wraps it in a
//! page with the theme and the backup block. Every piece of document text goes
//! through `Esc`, so a record cannot inject markup into the sheet.

use std::fmt::{self, Display, Write as _};

use rmu_core::UnifiedDocument;
use rmu_core::document::{
    AttackRow, Defenses, Details, Header, Inventory, QuickInfo, ResistanceRow, SkillGroup,
    SpellGroup, StatRow, TalentGroup,
};

use crate::error::RenderError;
use crate::layout::Layout;

/// Everything a template can see.
#[derive(Debug, Clone, Copy)]
pub struct SheetContext<'a> {
    pub document: &'a UnifiedDocument,
    pub layout: &'a Layout,
}

pub trait TemplateRenderer: Send + Sync {
    fn render(&self, template_id: &str, ctx: &SheetContext<'_>) -> Result<String, RenderError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinTemplates;

impl TemplateRenderer for BuiltinTemplates {
    fn render(&self, template_id: &str, ctx: &SheetContext<'_>) -> Result<String, RenderError> {
        let mut out = String::with_capacity(16 * 1024);
        match template_id {
            "sheet-standard" => standard(&mut out, ctx)?,
            "sheet-compact" => compact(&mut out, ctx)?,
            other => return Err(RenderError::UnknownTemplate(other.to_string())),
        }
        Ok(out)
    }
}

/// HTML-escaping display adapter, usable in text and attribute position.
pub struct Esc<'a>(pub &'a str);

impl Display for Esc<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rest = self.0;
        while let Some(pos) = rest.find(['&', '<', '>', '"', '\'']) {
            f.write_str(&rest[..pos])?;
            f.write_str(match rest.as_bytes()[pos] {
                b'&' => "&amp;",
                b'<' => "&lt;",
                b'>' => "&gt;",
                b'"' => "&quot;",
                _ => "&#39;",
            })?;
            rest = &rest[pos + 1..];
        }
        f.write_str(rest)
    }
}

pub fn escape_html(text: &str) -> String {
    Esc(text).to_string()
}

fn open_sheet(out: &mut String, ctx: &SheetContext<'_>) -> fmt::Result {
    writeln!(
        out,
        r#"<div class="rmu-sheet layout-{}" data-show-skills="{}" data-show-spells="{}">"#,
        Esc(ctx.layout.id),
        ctx.layout.show_skills,
        ctx.layout.show_spells
    )
}

fn close_sheet(out: &mut String, doc: &UnifiedDocument) -> fmt::Result {
    let meta = &doc.meta;
    writeln!(
        out,
        "<footer>Generated {} | system {} | exporter {}</footer>",
        meta.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        Esc(&meta.system_version),
        Esc(&meta.exporter_version)
    )?;
    writeln!(out, "</div>")
}

fn standard(out: &mut String, ctx: &SheetContext<'_>) -> fmt::Result {
    let doc = ctx.document;
    open_sheet(out, ctx)?;

    if let Some(header) = &doc.header {
        header_block(out, header)?;
    }
    if let Some(quick) = &doc.quick_info {
        quick_info_table(out, quick)?;
    }
    if doc.stats.is_some() || doc.resistances.is_some() {
        writeln!(out, r#"<div class="grid">"#)?;
        if let Some(stats) = &doc.stats {
            stats_table(out, stats)?;
        }
        if let Some(resistances) = &doc.resistances {
            resistances_table(out, resistances)?;
        }
        writeln!(out, "</div>")?;
    }
    if let Some(defenses) = &doc.defenses {
        defenses_block(out, defenses)?;
    }
    if let Some(attacks) = &doc.attacks {
        attacks_table(out, attacks)?;
    }
    if let Some(talents) = &doc.talents {
        talents_block(out, talents)?;
    }
    if let Some(groups) = &doc.skill_groups {
        skills_block(out, groups)?;
    }
    if let Some(spells) = &doc.spells {
        spells_block(out, spells)?;
    }
    if let Some(inventory) = &doc.inventory {
        inventory_block(out, inventory)?;
    }
    if let Some(details) = &doc.details {
        details_block(out, details)?;
    }

    close_sheet(out, doc)
}

fn header_block(out: &mut String, header: &Header) -> fmt::Result {
    writeln!(out, r#"<section class="identity">"#)?;
    if let Some(portrait) = &header.portrait {
        writeln!(
            out,
            r#"<img class="portrait" src="{}" alt="{}">"#,
            Esc(portrait),
            Esc(&header.name)
        )?;
    }
    writeln!(out, "<div>")?;
    writeln!(out, "<h1>{}</h1>", Esc(&header.name))?;
    writeln!(
        out,
        r#"<p class="subtitle">Level {} {} {} {}</p>"#,
        header.level,
        Esc(&header.race),
        Esc(&header.culture),
        Esc(&header.profession)
    )?;
    writeln!(out, "<table>")?;
    row2(out, "Realm", &header.realm)?;
    row2(out, "Size", &header.size)?;
    writeln!(out, "</table>")?;
    writeln!(out, "</div>")?;
    writeln!(out, "</section>")
}

fn quick_info_table(out: &mut String, quick: &QuickInfo) -> fmt::Result {
    writeln!(out, "<section>")?;
    writeln!(out, "<h2>Quick Info</h2>")?;
    writeln!(out, "<table>")?;
    writeln!(
        out,
        "<tr><th>BMR</th><th>Initiative</th><th>Hits</th><th>Power</th>\
         <th>Endurance (Phys)</th><th>Endurance (Ment)</th></tr>"
    )?;
    writeln!(
        out,
        "<tr><td>{} ({})</td><td>{}</td><td>{} / {}</td><td>{} / {}</td><td>{}</td><td>{}</td></tr>",
        Esc(&quick.bmr_value),
        Esc(&quick.bmr_mode),
        quick.initiative,
        quick.hits.current,
        quick.hits.max,
        quick.power.current,
        quick.power.max,
        quick.endurance_physical,
        quick.endurance_mental
    )?;
    writeln!(out, "</table>")?;
    writeln!(out, "</section>")
}

fn stats_table(out: &mut String, stats: &[StatRow]) -> fmt::Result {
    writeln!(out, "<section>")?;
    writeln!(out, "<h2>Stats</h2>")?;
    writeln!(out, "<table>")?;
    writeln!(out, "<tr><th>Stat</th><th></th><th>Bonus</th></tr>")?;
    for stat in stats {
        writeln!(
            out,
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
            Esc(&stat.label),
            Esc(&stat.name),
            stat.bonus
        )?;
    }
    writeln!(out, "</table>")?;
    writeln!(out, "</section>")
}

fn resistances_table(out: &mut String, resistances: &[ResistanceRow]) -> fmt::Result {
    writeln!(out, "<section>")?;
    writeln!(out, "<h2>Resistances</h2>")?;
    writeln!(out, "<table>")?;
    for resistance in resistances {
        writeln!(
            out,
            "<tr><td>{}</td><td>{}</td></tr>",
            Esc(&resistance.label),
            resistance.bonus
        )?;
    }
    writeln!(out, "</table>")?;
    writeln!(out, "</section>")
}

fn defenses_block(out: &mut String, defenses: &Defenses) -> fmt::Result {
    writeln!(out, "<section>")?;
    writeln!(out, "<h2>Defenses</h2>")?;
    writeln!(out, r#"<div class="grid">"#)?;

    writeln!(out, "<table>")?;
    writeln!(out, "<tr><td>Quickness</td><td>{}</td></tr>", defenses.quickness_bonus)?;
    writeln!(out, "<tr><td>Armor</td><td>{}</td></tr>", defenses.armor_db)?;
    writeln!(out, "<tr><td>Other</td><td>{}</td></tr>", defenses.other_db)?;
    writeln!(out, "<tr><td>Shield</td><td>{}</td></tr>", defenses.shield_bonus)?;
    writeln!(out, "<tr><th>Total DB</th><th>{}</th></tr>", defenses.total_db_current)?;
    writeln!(out, "</table>")?;

    tactical_table(out, defenses)?;

    writeln!(out, "<table>")?;
    writeln!(out, "<tr><th>Location</th><th>Armor</th><th>AT</th></tr>")?;
    let armor = &defenses.armor;
    for (location, piece) in [
        ("Head", &armor.head),
        ("Torso", &armor.torso),
        ("Arms", &armor.arms),
        ("Legs", &armor.legs),
    ] {
        writeln!(
            out,
            "<tr><td>{location}</td><td>{}</td><td>{}</td></tr>",
            Esc(&piece.name),
            piece.at
        )?;
    }
    writeln!(out, "</table>")?;

    writeln!(out, "</div>")?;
    writeln!(out, "</section>")
}

fn tactical_table(out: &mut String, defenses: &Defenses) -> fmt::Result {
    writeln!(out, "<table>")?;
    writeln!(out, "<tr><th>Mode</th><th>Dodge</th><th>Block</th></tr>")?;
    for row in &defenses.tactical {
        writeln!(
            out,
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
            Esc(&row.mode),
            row.dodge,
            row.block
        )?;
    }
    writeln!(out, "</table>")
}

fn attacks_table(out: &mut String, attacks: &[AttackRow]) -> fmt::Result {
    writeln!(out, "<section>")?;
    writeln!(out, "<h2>Attacks</h2>")?;
    writeln!(out, "<table>")?;
    writeln!(
        out,
        "<tr><th>Attack</th><th>Skill</th><th>Hands</th><th>OB</th><th>Table</th>\
         <th>Fumble</th><th>Reach</th><th>Range</th></tr>"
    )?;
    for attack in attacks {
        writeln!(
            out,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            Esc(&attack.name),
            Esc(&attack.specialization),
            Esc(&attack.handed),
            attack.ob,
            Esc(&attack.damage_type),
            attack.fumble,
            Esc(&attack.reach),
            Esc(&attack.range)
        )?;
    }
    writeln!(out, "</table>")?;
    writeln!(out, "</section>")
}

fn talents_block(out: &mut String, talents: &[TalentGroup]) -> fmt::Result {
    writeln!(out, "<section>")?;
    writeln!(out, "<h2>Talents &amp; Flaws</h2>")?;
    for group in talents {
        writeln!(out, "<h3>{}</h3>", Esc(&group.group))?;
        writeln!(out, "<ul>")?;
        for entry in &group.entries {
            if entry.tier.is_empty() {
                writeln!(out, "<li>{}</li>", Esc(&entry.name))?;
            } else {
                writeln!(out, "<li>{} (Tier {})</li>", Esc(&entry.name), Esc(&entry.tier))?;
            }
        }
        writeln!(out, "</ul>")?;
    }
    writeln!(out, "</section>")
}

fn skills_block(out: &mut String, groups: &[SkillGroup]) -> fmt::Result {
    writeln!(out, "<section>")?;
    writeln!(out, "<h2>Skills</h2>")?;
    for group in groups {
        writeln!(out, r#"<h3 data-category="{}">{}</h3>"#, Esc(&group.category), Esc(&group.label))?;
        writeln!(out, "<table>")?;
        writeln!(out, "<tr><th>Skill</th><th>Specialisation</th><th>Ranks</th><th>Bonus</th></tr>")?;
        for skill in &group.list {
            let class = if skill.favorite { r#" class="favorite""# } else { "" };
            writeln!(
                out,
                "<tr><td{class}>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                Esc(&skill.name),
                Esc(&skill.specialisation),
                skill.ranks,
                skill.bonus
            )?;
        }
        writeln!(out, "</table>")?;
    }
    writeln!(out, "</section>")
}

fn spells_block(out: &mut String, spells: &[SpellGroup]) -> fmt::Result {
    writeln!(out, "<section>")?;
    writeln!(out, "<h2>Spells</h2>")?;
    for group in spells {
        writeln!(out, "<h3>{} ({})</h3>", Esc(&group.list_name), Esc(&group.list_type))?;
        writeln!(out, "<table>")?;
        writeln!(out, "<tr><th>Lvl</th><th>Spell</th></tr>")?;
        for spell in &group.spells {
            writeln!(out, "<tr><td>{}</td><td>{}</td></tr>", spell.level, Esc(&spell.name))?;
        }
        writeln!(out, "</table>")?;
    }
    writeln!(out, "</section>")
}

fn inventory_block(out: &mut String, inventory: &Inventory) -> fmt::Result {
    writeln!(out, "<section>")?;
    writeln!(out, "<h2>Inventory</h2>")?;
    writeln!(out, "<table>")?;
    row2(out, "Weight Allowance", &inventory.weight_allowance)?;
    row2(out, "Weight Carried", &inventory.weight_carried)?;
    writeln!(out, "<tr><td>Encumbrance Penalty</td><td>{}</td></tr>", inventory.enc_penalty)?;
    row2(out, "Max Pace", &inventory.max_pace)?;
    writeln!(out, "</table>")?;
    writeln!(out, "<table>")?;
    writeln!(out, "<tr><th>Item</th><th>Qty</th><th>Weight</th></tr>")?;
    for item in &inventory.items {
        writeln!(
            out,
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
            Esc(&item.name),
            item.qty,
            Esc(&item.weight)
        )?;
    }
    writeln!(out, "</table>")?;
    writeln!(out, "</section>")
}

fn details_block(out: &mut String, details: &Details) -> fmt::Result {
    writeln!(out, "<section>")?;
    writeln!(out, "<h2>Details</h2>")?;
    writeln!(out, "<table>")?;
    for (label, value) in [
        ("Age", &details.age),
        ("Gender", &details.gender),
        ("Height", &details.height),
        ("Weight", &details.weight),
        ("Hair", &details.hair),
        ("Eyes", &details.eyes),
        ("Skin", &details.skin),
        ("Faith", &details.faith),
    ] {
        row2(out, label, value)?;
    }
    writeln!(out, "</table>")?;
    if !details.biography.is_empty() {
        writeln!(out, "<h3>Biography</h3>")?;
        writeln!(out, r#"<div class="biography">{}</div>"#, Esc(&details.biography))?;
    }
    writeln!(out, "</section>")
}

fn row2(out: &mut String, label: &str, value: &str) -> fmt::Result {
    writeln!(out, "<tr><td>{}</td><td>{}</td></tr>", Esc(label), Esc(value))
}

/// One screen: identity line, vitals, combat, then everything else inline.
fn compact(out: &mut String, ctx: &SheetContext<'_>) -> fmt::Result {
    let doc = ctx.document;
    open_sheet(out, ctx)?;

    if let Some(header) = &doc.header {
        writeln!(
            out,
            r#"<h1>{}</h1><p class="subtitle">Lvl {} {} {} | {} | {}</p>"#,
            Esc(&header.name),
            header.level,
            Esc(&header.race),
            Esc(&header.profession),
            Esc(&header.realm),
            Esc(&header.size)
        )?;
    }
    if let Some(quick) = &doc.quick_info {
        writeln!(
            out,
            "<p>BMR {} | Init {} | Hits {}/{} | PP {}/{}</p>",
            Esc(&quick.bmr_value),
            quick.initiative,
            quick.hits.current,
            quick.hits.max,
            quick.power.current,
            quick.power.max
        )?;
    }
    if let Some(stats) = &doc.stats {
        let line = join(stats.iter().map(|s| format!("{} {}", Esc(&s.label), s.bonus)));
        writeln!(out, "<p><strong>Stats</strong> {line}</p>")?;
    }
    if let Some(resistances) = &doc.resistances {
        let line = join(resistances.iter().map(|r| format!("{} {}", Esc(&r.label), r.bonus)));
        writeln!(out, "<p><strong>RR</strong> {line}</p>")?;
    }
    if let Some(defenses) = &doc.defenses {
        writeln!(out, "<h2>DB {}</h2>", defenses.total_db_current)?;
        tactical_table(out, defenses)?;
    }
    if let Some(attacks) = &doc.attacks {
        writeln!(out, "<h2>Attacks</h2>")?;
        writeln!(out, "<ul>")?;
        for attack in attacks {
            let distance = if attack.range.is_empty() { &attack.reach } else { &attack.range };
            writeln!(
                out,
                "<li>{} {} ({}) {}</li>",
                Esc(&attack.name),
                attack.ob,
                Esc(&attack.damage_type),
                Esc(distance)
            )?;
        }
        writeln!(out, "</ul>")?;
    }
    if let Some(talents) = &doc.talents {
        let line = join(
            talents
                .iter()
                .flat_map(|g| g.entries.iter())
                .map(|t| Esc(&t.name).to_string()),
        );
        writeln!(out, "<p><strong>Talents</strong> {line}</p>")?;
    }
    if let Some(groups) = &doc.skill_groups {
        let line = join(
            groups
                .iter()
                .flat_map(|g| g.list.iter())
                .map(|s| format!("{} {}", Esc(&s.name), s.bonus)),
        );
        writeln!(out, "<p><strong>Skills</strong> {line}</p>")?;
    }
    if let Some(spells) = &doc.spells {
        let line = join(spells.iter().map(|g| {
            format!("{} ({})", Esc(&g.list_name), g.spells.len())
        }));
        writeln!(out, "<p><strong>Spell Lists</strong> {line}</p>")?;
    }
    if let Some(inventory) = &doc.inventory {
        let items = join(inventory.items.iter().map(|i| format!("{} x{}", Esc(&i.name), i.qty)));
        writeln!(
            out,
            "<p><strong>Load</strong> {} / {} ({}) | {}</p>",
            Esc(&inventory.weight_carried),
            Esc(&inventory.weight_allowance),
            inventory.enc_penalty,
            Esc(&inventory.max_pace)
        )?;
        writeln!(out, "<p><strong>Gear</strong> {items}</p>")?;
    }
    if let Some(details) = &doc.details {
        writeln!(
            out,
            "<p><strong>Details</strong> {} | {} | {} | {}</p>",
            Esc(&details.age),
            Esc(&details.gender),
            Esc(&details.height),
            Esc(&details.weight)
        )?;
    }

    close_sheet(out, doc)
}

fn join(parts: impl Iterator<Item = String>) -> String {
    parts.collect::<Vec<_>>().join(", ")
}

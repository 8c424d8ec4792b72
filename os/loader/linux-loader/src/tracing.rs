//! # Trace output

use crate::driver::BootPlan;
use boot_console::console_trace;
use boot_info::tags::BootTagId;

/// Dumps the plan and walks the tag list the way the kernel will.
pub fn trace_boot_plan(plan: &BootPlan) {
    console_trace!("Boot plan in Linux loader:\n");
    console_trace!("   entry = {}", plan.entry);
    console_trace!(", kernel = {}", plan.kernel.region);
    console_trace!(", last = {} {}", plan.last.partition.label, plan.last.region);
    console_trace!("\n");
    console_trace!("tags ptr = {:08x}\n", plan.tags.as_ptr() as usize);

    for tag in plan.tags.iter() {
        match tag {
            Ok(tag) => {
                console_trace!("     tag = {:#06x}, size = {}", tag.id, tag.data.len());
                if tag.kind() == Some(BootTagId::CommandLine) {
                    let len = tag.data.iter().position(|&b| b == 0).unwrap_or(tag.data.len());
                    match core::str::from_utf8(&tag.data[..len]) {
                        Ok(cmdline) => console_trace!(", cmdline = \"{cmdline}\""),
                        Err(_) => console_trace!(", cmdline = <not UTF-8>"),
                    }
                }
                console_trace!("\n");
            }
            Err(e) => console_trace!("     {e}\n"),
        }
    }
}

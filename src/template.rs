//! Issue record template.
//!
//! Every line ends in CRLF. Block helpers never stand alone on a line, so
//! handlebars' standalone-tag whitespace stripping never applies.

pub const TEMPLATE: &str = concat!(
    "* Issue #{{number}}: {{title}}\r\n",
    "* Created at: {{created_at}}\r\n",
    "* Author: {{author}}",
    "{{#if labels}}\r\n",
    "* Labels: {{labels}}",
    "{{/if}}{{#if closing}}\r\n",
    "* Closed at: {{closing.at}}\r\n",
    "* Closed by: {{closing.by}}",
    "{{/if}}\r\n",
    "\r\n",
    "{{#if description}}## Description\r\n",
    "\r\n",
    "{{description.text}}\r\n",
    "\r\n",
    "{{/if}}{{#each comments}}## Comment #{{index}}\r\n",
    "\r\n",
    "* By {{author}}\r\n",
    "* At {{created_at}}\r\n",
    "{{body}}\r\n",
    "\r\n",
    "{{/each}}",
);

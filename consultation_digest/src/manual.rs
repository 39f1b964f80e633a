/*!

This is the long-form manual for `consultation_digest` and `cerfdash`.

## Input documents

Two JSON documents describe a consultation. They are produced by
`cerfdash aggregate` from the survey export, or by any other tool that
follows the same layout.

### Aggregates (`data.json`)

```text
{
  "generated_at": "2025-03-04T10:00:00+00:00",
  "total_responses": 12,
  "summary": {
    "total_responses": 12,
    "org_types": { "ONG nationale": 7, "Organisation conduite par des femmes": 5 },
    "top_service_1": { "Services SSR": 6, "Soutien psychosocial": 4 },
    ...
  },
  "by_org_type": {
    "ONG nationale": { "total_responses": 7, ... },
    ...
  }
}
```

Every object of a scope, besides `total_responses`, is a frequency table:
category label to count. The known tables are listed by
[crate::SurveyField]. Unknown tables are kept and charted but never quoted in
the narratives. The order of the entries is significant: when two categories
have the same count, the first one listed ranks first.

Counts are expected to be non-negative integers. Numbers written as strings
are accepted; anything else counts as 0.

### Records (`records.json`)

```text
{
  "generated_at": "...",
  "records": [
    { "date_interview": "2025-03-02", "organisation": "...", "org_type_label": "...", ... }
  ]
}
```

Each record is a flat object of strings, numbers or nulls. The table filters
use `org_type_label` and `province_label`; the sort modes use
`date_interview`, `organisation` and `province_label`.

Records may also be read from a CSV file (one header row) or from the Excel
export of the survey tool, in which case `cerfdash aggregate` maps the raw
question names (such as `intro/org_type`) to the columns above.

## Percentages

Single-select questions are quoted as a percentage of the responses of the
scope. Multi-select questions are quoted as a number of mentions, since one
response may mention several categories. The severity of referral
disruptions is quoted as a percentage of its own mentions.

## Configuration

`cerfdash` accepts a JSON configuration file with `--config`:

```text
{
  "sources": {
    "aggregatesPath": "data.json",
    "recordsPath": "records.json",
    "recordsProvider": "json",
    "labelsPath": "labels.json"
  },
  "view": { "scope": "__all__", "province": "__all__", "query": "", "sort": "date_desc" },
  "output": {
    "outputDirectory": "out",
    "viewPath": "view.json",
    "narrativesPath": "narratives.md",
    "csvPath": "table.csv"
  }
}
```

Paths are relative to the configuration file. Command-line flags take
precedence over the file.

## Labels

The survey tool exports coded answers (`ssr`, `deplacees handicap`).
`cerfdash aggregate` replaces them with the labels of their answer domain.
Multi-select answers are labelled part by part and joined with ", ".
Unknown codes are kept as they are. A labels file (`--labels` or
`labelsPath`) adds or replaces labels:

```text
{ "groupes": { "deplacees": "Femmes déplacées" }, "service": { "ssr": "Services SSR" } }
```

 */

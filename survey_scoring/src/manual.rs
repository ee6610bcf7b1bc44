/*!

This is the long-form manual for `survey_scoring` and `surveyclean`.

## Input

The input is the result export of one survey, in Excel (.xlsx) format. The
export is expected to contain a single relevant sheet laid out as follows:

* row 23 is the header row. Columns A to C hold the question label, the
  difficulty and the average score (`Avg. Score (%)`).
* the questions follow from row 24 onwards, one per row, until the first row
  with an empty label.
* cell D23 is empty. `surveyclean` writes the `Question Order` header there,
  so a non-empty D23 means that the file was already processed and it will
  be rejected.
* the format of A23 (font, fill colour, alignment) is copied to the new
  header cells. The `style` settings below are used when A23 has no format.

The rows of the export are not reliably in questionnaire order. The number in
each label (`Q12 ...` -> 12) is used to restore the order, and the questions
are then renumbered from 1.

## Templates

Four questionnaires are known. The export does not say which one it comes
from, so it is recognized from its shape, checking in this order:

| Template   | Recognized by                                   |
|------------|-------------------------------------------------|
| `Review`   | exactly 38 questions                            |
| `NoLeader` | exactly 47 questions                            |
| `Leader`   | the lowest-numbered question reads `Q7...`      |
| `Team`     | anything else                                   |

## Categories

Each question receives, by position:

* a 1st order category: `THRIVE` or `Just Leader`
* a 2nd order category: `Trust`, `Health`, `Relationships`, `Impact`,
  `Value`, `Engagement`, `Purpose`, `Growth`, `Recognition` or `Just Leader`
* for the `Leader` and `Team` questionnaires only, a 3rd order category:
  `Leader` or `Team`. The Health questions are not split and read `n/a`.

The number of questions of each category is fixed by the questionnaire. If
the export does not have exactly the expected number of questions, it is
rejected rather than categorized approximately.

## Averages

Averages are the plain mean of the scores of the questions of a category.
They are reported for each level, plus an overall average over all the
questions. In the `Review` questionnaire, the `Just Leader` questions do not
get an average of their own (neither 1st nor 2nd order, the sheet shows
`n/a`), but they still count in the overall average.

## Comparison

When a `Leader` and a `Team` export are processed together, a comparison
report is added. It pairs the questions with the same question order and
sorts them by decreasing difference (leader score minus team score).
Questions that only exist on one side are left out of the comparison.

## Running

```text
surveyclean [--out DIR] [--config report.json] [--keep-going] [--verbose] FILE.xlsx...
```

Each export is written back as `<name>_clean.xlsx`. A single output is
written as is; several outputs (including the comparison) are put in one zip
archive, `survey_reports.zip` by default.

The optional JSON configuration changes the look and the names of the
outputs. All its fields are optional:

```json
{
  "suffix": "_clean",
  "comparisonName": "Leader-Team_Comparison",
  "archiveName": "survey_reports.zip",
  "isolateFailures": false,
  "style": {
    "fontName": "Calibri",
    "fontSize": 11,
    "headerFill": "#D9E1F2",
    "headerFontColor": "#000000",
    "headerAlign": "center",
    "headerWrap": true,
    "averageFormat": "0.0",
    "headerRowHeight": 30,
    "rowHeight": 15
  }
}
```

By default the first file that cannot be processed stops the batch and
nothing is written. With `--keep-going` (or `isolateFailures`) the failing
files are reported and the others are still processed.

Two uploads with the same name give `name_clean.xlsx` and
`name_clean (2).xlsx`.

*/
